//! Locally served endpoints
//!
//! An endpoint is a named, typed property or action this entity exposes to
//! remote peers. The adapter only registers descriptors; the runtime calls
//! the handlers when a peer reads, writes or invokes the endpoint.

use std::sync::Arc;

/// Value type of an endpoint as announced to peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Int,
    Float,
    String,
}

/// Single-shot responder handed to endpoint handlers
///
/// Mirrors the runtime's error-first reply: `ok(v)` answers `(null, v)`,
/// `err(v)` answers `(true, v)`.
pub struct Reply {
    respond: Box<dyn FnOnce(Result<serde_json::Value, serde_json::Value>) + Send + 'static>,
}

impl Reply {
    pub fn new<F>(respond: F) -> Self
    where
        F: FnOnce(Result<serde_json::Value, serde_json::Value>) + Send + 'static,
    {
        Self {
            respond: Box::new(respond),
        }
    }

    /// Build a reply that forwards to an error-first callback
    pub fn from_callback<F>(callback: F) -> Self
    where
        F: FnOnce(serde_json::Value, serde_json::Value) + Send + 'static,
    {
        Self::new(move |result| match result {
            Ok(value) => callback(serde_json::Value::Null, value),
            Err(value) => callback(serde_json::Value::Bool(true), value),
        })
    }

    pub fn ok(self, value: impl Into<serde_json::Value>) {
        self.send(Ok(value.into()))
    }

    pub fn err(self, value: impl Into<serde_json::Value>) {
        self.send(Err(value.into()))
    }

    pub fn send(self, result: Result<serde_json::Value, serde_json::Value>) {
        (self.respond)(result)
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply").finish_non_exhaustive()
    }
}

/// Endpoint handler: `(args, peer, reply)`
pub type Handler = Arc<dyn Fn(serde_json::Value, serde_json::Value, Reply) + Send + Sync + 'static>;

/// Endpoint descriptor registered with the runtime
#[derive(Clone)]
pub struct Endpoint {
    pub kind: EndpointType,
    pub read: Option<Handler>,
    pub write: Option<Handler>,
    pub invoke: Option<Handler>,
}

impl Endpoint {
    /// Endpoint with no behavior, only a type
    pub fn new(kind: EndpointType) -> Self {
        Self {
            kind,
            read: None,
            write: None,
            invoke: None,
        }
    }

    pub fn with_read<F>(mut self, handler: F) -> Self
    where
        F: Fn(serde_json::Value, serde_json::Value, Reply) + Send + Sync + 'static,
    {
        self.read = Some(Arc::new(handler));
        self
    }

    pub fn with_write<F>(mut self, handler: F) -> Self
    where
        F: Fn(serde_json::Value, serde_json::Value, Reply) + Send + Sync + 'static,
    {
        self.write = Some(Arc::new(handler));
        self
    }

    pub fn with_invoke<F>(mut self, handler: F) -> Self
    where
        F: Fn(serde_json::Value, serde_json::Value, Reply) + Send + Sync + 'static,
    {
        self.invoke = Some(Arc::new(handler));
        self
    }

    /// Read-only endpoint that always answers with `value`
    pub fn constant(kind: EndpointType, value: impl Into<serde_json::Value>) -> Self {
        let value = value.into();
        Self::new(kind).with_read(move |_args, _peer, reply| reply.ok(value.clone()))
    }

    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    pub fn is_invokable(&self) -> bool {
        self.invoke.is_some()
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("kind", &self.kind)
            .field("read", &self.is_readable())
            .field("write", &self.is_writable())
            .field("invoke", &self.is_invokable())
            .finish()
    }
}
