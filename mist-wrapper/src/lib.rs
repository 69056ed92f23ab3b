//! # mist-wrapper: async adapter over the Mist/Wish runtime
//!
//! The Mist/Wish runtime speaks an error-first callback protocol: every
//! request is `command, args, callback(err, data)`. This crate turns that
//! into `async fn`s returning `Result`, and layers the identity bootstrap
//! (`get_own_identity`, `ensure_identity`) and signal subscriptions on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   async / Result   ┌──────────────────┐  command + callback  ┌────────────┐
//! │   application   │◄──────────────────►│   MistWrapper    │◄────────────────────►│  Backend   │
//! │                 │                    │ (bridge, identity│                      │ wish, mist │
//! └─────────────────┘                    │  signals)        │                      └────────────┘
//!                                        └──────────────────┘
//! ```
//!
//! The runtime binding itself sits behind the [`Backend`] and [`Connector`]
//! traits, so the adapter can run against any binding or an in-memory fake.

pub mod backend;
pub mod bridge;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod signal;
pub mod wrapper;

#[cfg(test)]
mod testing;

pub use backend::{Backend, Callback, Channel, ChannelKind, Connector, ReadyCallback};
pub use bridge::{PendingRequest, Settled, is_truthy, send};
pub use config::ConnectionConfig;
pub use endpoint::{Endpoint, EndpointType, Handler, Reply};
pub use error::{IdentityError, OpenError, TransportError};
pub use identity::{ExportedContact, Identity, IdentityWorkflow, NOT_FOUND_GRACE, OwnIdentity};
pub use signal::{FRIEND_REQUEST, Signal, SignalFilter, SignalStream};
pub use wrapper::MistWrapper;
