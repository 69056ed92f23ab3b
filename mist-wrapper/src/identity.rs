//! Identity workflow on top of the Wish channel
//!
//! Two multi-step operations:
//!
//! - [`IdentityWorkflow::get_own_identity`]: list identities, pick the one
//!   holding a private key, export it as a contact
//! - [`IdentityWorkflow::ensure_identity`]: create an identity, treating
//!   "already exists" (304) as success

use std::time::Duration;

use crate::backend::Channel;
use crate::bridge::{self, is_truthy};
use crate::error::{IdentityError, TransportError};

/// How long `get_own_identity` waits before reporting "Not found"
///
/// Measured from the start of the `identity.list` call.
pub const NOT_FOUND_GRACE: Duration = Duration::from_secs(2);

/// Status code the Wish core uses for "identity already exists"
pub const ALREADY_EXISTS: i64 = 304;

pub const LIST_COMMAND: &str = "identity.list";
pub const EXPORT_COMMAND: &str = "identity.export";
pub const CREATE_COMMAND: &str = "identity.create";

/// Identity record as returned by the Wish core
///
/// Only `uid` and the `privkey` marker are interpreted; the rest is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Identity(pub serde_json::Value);

impl Identity {
    pub fn uid(&self) -> Option<&serde_json::Value> {
        self.0.get("uid")
    }

    /// Whether the record carries private key material (i.e. it is ours)
    pub fn is_mine(&self) -> bool {
        self.0.get("privkey").is_some_and(is_truthy)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Identity {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Shareable export of an [`Identity`]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ExportedContact(pub serde_json::Value);

/// Our identity together with its exported contact
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OwnIdentity {
    pub identity: Identity,
    pub contact: ExportedContact,
}

/// Identity operations bound to one identity channel
pub struct IdentityWorkflow<'a> {
    wish: &'a dyn Channel,
    not_found_grace: Duration,
}

impl<'a> IdentityWorkflow<'a> {
    pub fn new(wish: &'a dyn Channel) -> Self {
        Self {
            wish,
            not_found_grace: NOT_FOUND_GRACE,
        }
    }

    pub fn with_not_found_grace(mut self, grace: Duration) -> Self {
        self.not_found_grace = grace;
        self
    }

    /// Fetch our own identity and its exported contact
    ///
    /// The first listed identity holding a private key wins. If several do,
    /// the rest are ignored. When none does, this fails with
    /// [`IdentityError::NotFound`] once the grace window has passed.
    pub async fn get_own_identity(&self) -> Result<OwnIdentity, IdentityError> {
        let started = tokio::time::Instant::now();

        let list = bridge::send(self.wish, LIST_COMMAND, Vec::new())
            .await
            .map_err(|payload| {
                tracing::error!("Listing identities failed: {payload}");
                TransportError::new(LIST_COMMAND, payload)
            })?;

        let entries = list.as_array().map(Vec::as_slice).unwrap_or_default();
        let mut mine = entries
            .iter()
            .map(|entry| Identity(entry.clone()))
            .filter(Identity::is_mine);

        let Some(identity) = mine.next() else {
            tracing::debug!(listed = entries.len(), "No identity with a private key");
            tokio::time::sleep_until(started + self.not_found_grace).await;
            return Err(IdentityError::NotFound);
        };

        let ignored = mine.count();
        if ignored > 0 {
            tracing::warn!(ignored, "Several identities hold a private key; using the first");
        }

        let uid = match identity.uid() {
            Some(uid) => uid.clone(),
            None => {
                tracing::warn!("Identity holding a private key has no uid; exporting null");
                serde_json::Value::Null
            }
        };
        let contact = bridge::send(self.wish, EXPORT_COMMAND, vec![uid])
            .await
            .map_err(|payload| TransportError::new(EXPORT_COMMAND, payload))?;

        Ok(OwnIdentity {
            identity,
            contact: ExportedContact(contact),
        })
    }

    /// Create an identity called `name`, or accept that it already exists
    ///
    /// On 304 the failure payload itself is returned as the identity.
    pub async fn ensure_identity(&self, name: &str) -> Result<Identity, IdentityError> {
        match bridge::send(self.wish, CREATE_COMMAND, vec![name.into()]).await {
            Ok(created) => {
                tracing::info!(name, "Created identity");
                Ok(Identity(created))
            }
            Err(payload) => {
                let error = TransportError::new(CREATE_COMMAND, payload);
                if error.code() == Some(ALREADY_EXISTS) {
                    tracing::debug!(name, "Identity already exists");
                    Ok(Identity(error.payload))
                } else {
                    Err(error.into())
                }
            }
        }
    }
}
