//! Scripted in-memory runtime for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::backend::{Backend, Callback, Channel, Connector, ReadyCallback};
use crate::config::ConnectionConfig;
use crate::endpoint::{Endpoint, Reply};

/// Answers one command; returns the callback when it should stay registered
pub type Responder = Arc<dyn Fn(&[Value], Callback) -> Option<Callback> + Send + Sync>;

pub mod reply {
    use super::*;

    pub fn responder<F>(f: F) -> Responder
    where
        F: Fn(&[Value], Callback) -> Option<Callback> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    pub fn raw(err: Value, data: Value) -> Responder {
        responder(move |_args, mut callback| {
            callback(err.clone(), data.clone());
            None
        })
    }

    pub fn ok(data: Value) -> Responder {
        raw(Value::Null, data)
    }

    pub fn err(data: Value) -> Responder {
        raw(Value::Bool(true), data)
    }

    /// Compute the reply from the request arguments
    pub fn with<F>(f: F) -> Responder
    where
        F: Fn(&[Value]) -> (Value, Value) + Send + Sync + 'static,
    {
        responder(move |args, mut callback| {
            let (err, data) = f(args);
            callback(err, data);
            None
        })
    }

    /// Call back several times for the same request
    pub fn repeated(replies: Vec<(Value, Value)>) -> Responder {
        responder(move |_args, mut callback| {
            for (err, data) in replies.clone() {
                callback(err, data);
            }
            None
        })
    }

    /// Reply from a spawned task after `delay`
    pub fn delayed(delay: Duration, err: Value, data: Value) -> Responder {
        responder(move |_args, mut callback| {
            let (err, data) = (err.clone(), data.clone());
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                callback(err, data);
            });
            None
        })
    }

    /// Keep the callback without answering; use `emit` to drive it later
    pub fn never() -> Responder {
        responder(|_args, callback| Some(callback))
    }

    /// Drop the callback without answering
    pub fn dropped() -> Responder {
        responder(|_args, callback| {
            drop(callback);
            None
        })
    }
}

#[derive(Default)]
pub struct ScriptedChannel {
    responders: Mutex<HashMap<String, Responder>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    held: Mutex<Vec<(String, Callback)>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, command: &str, responder: Responder) -> Self {
        self.responders
            .lock()
            .unwrap()
            .insert(command.to_string(), responder);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, command: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(c, _)| c == command)
            .map(|(_, args)| args)
            .collect()
    }

    /// Invoke every held callback for `command`
    pub fn emit(&self, command: &str, err: Value, data: Value) {
        for (held, callback) in self.held.lock().unwrap().iter_mut() {
            if held == command {
                callback(err.clone(), data.clone());
            }
        }
    }
}

impl Channel for ScriptedChannel {
    fn request(&self, command: &str, args: Vec<Value>, mut callback: Callback) {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args.clone()));

        let responder = self.responders.lock().unwrap().get(command).cloned();
        match responder {
            Some(responder) => {
                if let Some(callback) = responder(args.as_slice(), callback) {
                    self.held
                        .lock()
                        .unwrap()
                        .push((command.to_string(), callback));
                }
            }
            None => callback(
                Value::Bool(true),
                serde_json::json!({"code": 404, "msg": format!("unscripted command {command}")}),
            ),
        }
    }
}

#[derive(Default)]
pub struct MockBackend {
    wish: ScriptedChannel,
    mist: ScriptedChannel,
    endpoints: Mutex<Vec<(String, Endpoint)>>,
    changed: Mutex<Vec<String>>,
    ready: Mutex<Vec<ReadyCallback>>,
}

impl MockBackend {
    pub fn new(wish: ScriptedChannel, mist: ScriptedChannel) -> Self {
        Self {
            wish,
            mist,
            ..Self::default()
        }
    }

    pub fn wish_channel(&self) -> &ScriptedChannel {
        &self.wish
    }

    pub fn mist_channel(&self) -> &ScriptedChannel {
        &self.mist
    }

    pub fn endpoint(&self, name: &str) -> Option<Endpoint> {
        self.endpoints
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, endpoint)| endpoint.clone())
    }

    pub fn endpoint_names(&self) -> Vec<String> {
        self.endpoints
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn changed_names(&self) -> Vec<String> {
        self.changed.lock().unwrap().clone()
    }

    pub fn ready_listeners(&self) -> usize {
        self.ready.lock().unwrap().len()
    }

    pub fn fire_ready(&self) {
        for callback in self.ready.lock().unwrap().iter_mut() {
            callback();
        }
    }
}

impl Backend for MockBackend {
    fn wish(&self) -> &dyn Channel {
        &self.wish
    }

    fn mist(&self) -> &dyn Channel {
        &self.mist
    }

    fn add_endpoint(&self, name: &str, endpoint: Endpoint) {
        self.endpoints
            .lock()
            .unwrap()
            .push((name.to_string(), endpoint));
    }

    fn changed(&self, name: &str) {
        self.changed.lock().unwrap().push(name.to_string());
    }

    fn on_ready(&self, callback: ReadyCallback) {
        self.ready.lock().unwrap().push(callback);
    }
}

#[derive(Default)]
pub struct MockConnector {
    failure: Option<String>,
}

impl MockConnector {
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Backend = MockBackend;

    async fn connect(&self, _config: &ConnectionConfig) -> eyre::Result<MockBackend> {
        match &self.failure {
            Some(reason) => Err(eyre::eyre!("{reason}")),
            None => Ok(MockBackend::default()),
        }
    }
}

/// Reply that stores the `(err, data)` it is answered with
pub fn capture_reply() -> (Reply, Arc<Mutex<Option<(Value, Value)>>>) {
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let reply = Reply::from_callback(move |err, data| {
        *sink.lock().unwrap() = Some((err, data));
    });
    (reply, slot)
}

/// Route `tracing` output through the test harness; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
