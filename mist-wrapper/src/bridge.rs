//! Error-first callback to future conversion
//!
//! [`send`] is the single request primitive every other operation is built
//! on. It issues one runtime call and settles exactly once:
//!
//! - falsy `err`: `Ok(data)`
//! - truthy `err`: `Err(data)`; the payload is the *second* callback argument,
//!   not `err`, which is what existing runtime consumers rely on
//!
//! There is no timeout, retry or cancellation. If the runtime never calls
//! back (or drops the callback without calling it), the future never
//! completes. Dropping the future abandons interest in the reply, but the
//! runtime still carries out the request.

use crate::backend::Channel;

/// JavaScript-style truthiness of a runtime value
///
/// `null`, `false`, numeric zero and the empty string are falsy. Everything
/// else, including empty arrays and objects, is truthy.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Outcome of one runtime round-trip
pub type Settled = Result<serde_json::Value, serde_json::Value>;

/// Reply slot for a single in-flight request
///
/// Settles at most once; later callbacks for the same request are ignored.
#[derive(Debug)]
pub struct PendingRequest {
    command: String,
    reply: Option<tokio::sync::oneshot::Sender<Settled>>,
}

impl PendingRequest {
    pub fn new(command: impl Into<String>) -> (Self, tokio::sync::oneshot::Receiver<Settled>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (
            Self {
                command: command.into(),
                reply: Some(tx),
            },
            rx,
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_settled(&self) -> bool {
        self.reply.is_none()
    }

    /// Settle from an error-first callback; returns `false` if already settled
    pub fn settle(&mut self, err: serde_json::Value, data: serde_json::Value) -> bool {
        let Some(reply) = self.reply.take() else {
            tracing::warn!(command = %self.command, "Ignoring repeated reply for settled request");
            return false;
        };
        let outcome = if is_truthy(&err) {
            tracing::debug!(command = %self.command, "Request failed: {data}");
            Err(data)
        } else {
            tracing::debug!(command = %self.command, "Request succeeded");
            Ok(data)
        };
        // The receiver is gone when the caller dropped its future; nothing to do.
        let _ = reply.send(outcome);
        true
    }
}

/// Send `command` with `args` over `channel` and wait for the reply
pub async fn send(channel: &dyn Channel, command: &str, args: Vec<serde_json::Value>) -> Settled {
    let (mut pending, rx) = PendingRequest::new(command);

    tracing::debug!(command, args = args.len(), "Sending request");
    channel.request(
        command,
        args,
        Box::new(move |err, data| {
            pending.settle(err, data);
        }),
    );

    match rx.await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(command, "Runtime dropped the callback without replying; request will never settle");
            std::future::pending().await
        }
    }
}
