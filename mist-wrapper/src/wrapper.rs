//! The adapter instance
//!
//! [`MistWrapper`] owns one runtime connection and its configuration. Every
//! public operation is a single request (or a short sequence of them) over
//! the Wish or Mist channel.
//!
//! ```rust,no_run
//! # use mist_wrapper::{ConnectionConfig, Connector, MistWrapper};
//! # async fn example<C: Connector + Sync>(connector: C) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::from_env("lamp");
//! let mist = MistWrapper::open(config, &connector).await?;
//! mist.on_ready().await;
//!
//! mist.ensure_identity("lamp").await?;
//! let own = mist.get_own_identity().await?;
//! println!("running as {:?}", own.identity.uid());
//! # Ok(())
//! # }
//! ```
//!
//! Callers must await [`MistWrapper::on_ready`] before issuing requests;
//! nothing enforces this. No request times out: if the runtime never
//! answers, the returned future never completes.

use std::sync::Arc;

use crate::backend::{Backend, ChannelKind, Connector};
use crate::bridge;
use crate::config::ConnectionConfig;
use crate::endpoint::{Endpoint, EndpointType};
use crate::error::{IdentityError, OpenError, TransportError};
use crate::identity::{Identity, IdentityWorkflow, OwnIdentity};
use crate::signal::{self, Signal, SignalFilter, SignalStream};

/// Marker endpoint every entity exposes
pub const MIST_ENDPOINT: &str = "mist";

/// Read-only endpoint holding the entity name
pub const NAME_ENDPOINT: &str = "mist.name";

/// Adapter over one runtime connection
pub struct MistWrapper<B: Backend> {
    config: ConnectionConfig,
    backend: B,
    ready: Arc<tokio::sync::watch::Sender<bool>>,
}

impl<B: Backend> MistWrapper<B> {
    /// Connect to the Wish core named by `config`
    #[tracing::instrument(skip_all, fields(config = %config))]
    pub async fn open<C>(config: ConnectionConfig, connector: &C) -> Result<Self, OpenError>
    where
        C: Connector<Backend = B> + Sync,
    {
        let backend = match connector.connect(&config).await {
            Ok(backend) => backend,
            Err(source) => {
                tracing::error!("Failed to connect: {source}");
                return Err(OpenError::Unreachable {
                    host: config.host_address().to_string(),
                    port: config.host_port().to_string(),
                    source,
                });
            }
        };
        tracing::info!("Connected to Wish core");
        Ok(Self::from_backend(config, backend))
    }

    /// Wrap an already connected runtime
    ///
    /// Registers the `mist` marker endpoint and the read-only `mist.name`
    /// endpoint, and starts listening for readiness.
    pub fn from_backend(config: ConnectionConfig, backend: B) -> Self {
        backend.add_endpoint(MIST_ENDPOINT, Endpoint::new(EndpointType::String));
        backend.add_endpoint(
            NAME_ENDPOINT,
            Endpoint::constant(EndpointType::String, config.name()),
        );

        let ready = Arc::new(tokio::sync::watch::Sender::new(false));
        let latch = ready.clone();
        backend.on_ready(Box::new(move || {
            if !latch.send_replace(true) {
                tracing::info!("Runtime ready");
            }
        }));

        Self {
            config,
            backend,
            ready,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once the runtime has signalled readiness
    ///
    /// Readiness is latched: later calls resolve immediately, and repeated
    /// signals from the runtime change nothing.
    pub async fn on_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Raw request on either channel; see [`bridge::send`]
    pub async fn request(
        &self,
        channel: ChannelKind,
        command: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, serde_json::Value> {
        tracing::debug!(%channel, command, "Routing request");
        bridge::send(self.backend.channel(channel), command, args).await
    }

    /// Request on the identity/discovery (Wish) channel
    pub async fn wish_request(
        &self,
        command: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, TransportError> {
        self.request(ChannelKind::Wish, command, args)
            .await
            .map_err(|payload| TransportError::new(command, payload))
    }

    /// Request on the peer/control (Mist) channel
    pub async fn mist_request(
        &self,
        command: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, TransportError> {
        self.request(ChannelKind::Mist, command, args)
            .await
            .map_err(|payload| TransportError::new(command, payload))
    }

    pub fn identities(&self) -> IdentityWorkflow<'_> {
        IdentityWorkflow::new(self.backend.wish())
    }

    /// Our own identity and its exported contact
    pub async fn get_own_identity(&self) -> Result<OwnIdentity, IdentityError> {
        self.identities().get_own_identity().await
    }

    /// Create the identity `name` unless it already exists
    pub async fn ensure_identity(&self, name: &str) -> Result<Identity, IdentityError> {
        self.identities().ensure_identity(name).await
    }

    /// Entities found by Wish local discovery
    pub async fn local_list(&self) -> Result<serde_json::Value, TransportError> {
        self.wish_request("wld.list", Vec::new()).await
    }

    /// Send a friend request to a locally discovered entity
    pub async fn local_friend_request(
        &self,
        local_uid: serde_json::Value,
        remote_uid: serde_json::Value,
        rhid: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        self.wish_request("wld.friendRequest", vec![local_uid, remote_uid, rhid])
            .await
    }

    pub async fn list_friend_requests(&self) -> Result<serde_json::Value, TransportError> {
        self.wish_request("identity.friendRequestList", Vec::new())
            .await
    }

    pub async fn accept_friend(
        &self,
        local_uid: serde_json::Value,
        remote_uid: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        self.wish_request("identity.friendRequestAccept", vec![local_uid, remote_uid])
            .await
    }

    /// All known peers (friends)
    pub async fn list_friends(&self) -> Result<serde_json::Value, TransportError> {
        self.mist_request("listPeers", Vec::new()).await
    }

    /// Invoke `action` on `friend`, a peer object as returned by [`Self::list_friends`]
    pub async fn invoke(
        &self,
        friend: serde_json::Value,
        action: &str,
    ) -> Result<serde_json::Value, TransportError> {
        self.mist_request("mist.control.invoke", vec![friend, action.into()])
            .await
    }

    /// Call `callback` for every signal the runtime pushes
    ///
    /// Each call opens its own `signals` subscription. Notifications the
    /// runtime flags as errors are dropped.
    pub fn on_signal<F>(&self, mut callback: F)
    where
        F: FnMut(Signal) + Send + 'static,
    {
        self.backend.mist().request(
            signal::SIGNALS_COMMAND,
            Vec::new(),
            Box::new(move |err, data| {
                if bridge::is_truthy(&err) {
                    tracing::debug!("Dropping failed signal notification: {data}");
                    return;
                }
                callback(Signal::from_value(data));
            }),
        );
    }

    /// Call `callback` for every incoming friend request
    pub fn on_friend_request<F>(&self, callback: F)
    where
        F: FnMut(Signal) + Send + 'static,
    {
        self.on_filtered_signal(SignalFilter::friend_requests(), callback);
    }

    pub fn on_filtered_signal<F>(&self, filter: SignalFilter, mut callback: F)
    where
        F: FnMut(Signal) + Send + 'static,
    {
        self.on_signal(move |signal| {
            if filter.accepts(&signal) {
                callback(signal);
            }
        });
    }

    /// Signals as a stream, filtered by `filter`
    ///
    /// The subscription stays open for the lifetime of the runtime connection;
    /// dropping the stream only stops delivery.
    pub fn signals(&self, filter: SignalFilter) -> SignalStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.on_filtered_signal(filter, move |signal| {
            // A closed receiver just means nobody is listening any more.
            let _ = tx.send(signal);
        });
        tokio_stream::wrappers::UnboundedReceiverStream::new(rx)
    }

    /// Register a locally served endpoint
    pub fn add_endpoint(&self, name: &str, endpoint: Endpoint) {
        tracing::debug!(name, ?endpoint, "Adding endpoint");
        self.backend.add_endpoint(name, endpoint);
    }

    /// Tell observers that the value of endpoint `name` changed
    pub fn changed(&self, name: &str) {
        tracing::debug!(name, "Endpoint changed");
        self.backend.changed(name);
    }
}

impl<B: Backend> std::fmt::Debug for MistWrapper<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistWrapper")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
