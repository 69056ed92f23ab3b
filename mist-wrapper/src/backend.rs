//! The seam to the external Mist runtime
//!
//! Everything substantive (identity crypto, discovery, routing, the wire
//! protocol to the Wish core) lives behind these traits. The adapter only
//! issues commands and receives error-first callbacks.
//!
//! ```text
//! ┌──────────────┐  wish(): identity.*, wld.*   ┌──────────────────┐
//! │ MistWrapper  │─────────────────────────────►│                  │
//! │  (adapter)   │  mist(): listPeers, signals  │  Backend (Mist)  │
//! │              │─────────────────────────────►│                  │
//! └──────────────┘  add_endpoint / changed      └──────────────────┘
//! ```

use crate::config::ConnectionConfig;
use crate::endpoint::Endpoint;

/// Error-first callback handed to the runtime with every request
///
/// Called as `(err, data)`. For one-shot requests the runtime calls it once;
/// for subscriptions such as `signals` it keeps calling it for every event.
pub type Callback = Box<dyn FnMut(serde_json::Value, serde_json::Value) + Send + 'static>;

/// Readiness callback registered with [`Backend::on_ready`]
pub type ReadyCallback = Box<dyn FnMut() + Send + 'static>;

/// One command namespace of the runtime
pub trait Channel: Send + Sync {
    /// Issue `command` with `args`; the reply arrives through `callback`
    fn request(&self, command: &str, args: Vec<serde_json::Value>, callback: Callback);
}

/// Which of the two runtime channels a request goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Identity and local discovery (`identity.*`, `wld.*`)
    Wish,
    /// Peers and remote control (`listPeers`, `mist.control.*`, `signals`)
    Mist,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Wish => write!(f, "wish"),
            ChannelKind::Mist => write!(f, "mist"),
        }
    }
}

/// A connected runtime instance
pub trait Backend: Send + Sync + 'static {
    /// Identity/discovery channel
    fn wish(&self) -> &dyn Channel;

    /// Peer/control channel
    fn mist(&self) -> &dyn Channel;

    /// Register a locally served endpoint; its handlers are called by the runtime
    fn add_endpoint(&self, name: &str, endpoint: Endpoint);

    /// Tell observers that the value behind `name` changed
    fn changed(&self, name: &str);

    /// Register interest in the runtime's readiness signal
    ///
    /// The runtime may fire the callback more than once.
    fn on_ready(&self, callback: ReadyCallback);

    fn channel(&self, kind: ChannelKind) -> &dyn Channel {
        match kind {
            ChannelKind::Wish => self.wish(),
            ChannelKind::Mist => self.mist(),
        }
    }
}

/// Builds a [`Backend`] for a [`ConnectionConfig`]
#[async_trait::async_trait]
pub trait Connector {
    type Backend: Backend;

    async fn connect(&self, config: &ConnectionConfig) -> eyre::Result<Self::Backend>;
}
