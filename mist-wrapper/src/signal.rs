//! Runtime signals
//!
//! The runtime pushes unsolicited notifications over a single long-lived
//! `signals` request on the Mist channel. Each notification is tagged with a
//! kind string; consumers subscribe once and filter on that tag.

/// Kind tag of an incoming friend request
pub const FRIEND_REQUEST: &str = "friendRequest";

/// Mist command that opens the signal stream
pub const SIGNALS_COMMAND: &str = "signals";

/// A decoded runtime notification
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Signal {
    pub kind: String,
    pub args: Vec<serde_json::Value>,
}

impl Signal {
    pub fn new(kind: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            kind: kind.into(),
            args,
        }
    }

    /// Decode the `data` part of a `signals` callback
    ///
    /// - `["kind", a, b]` gives kind `kind` and args `[a, b]`
    /// - `"kind"` gives kind `kind` and no args
    /// - any other value gives an empty kind with the value as the only arg
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                let mut items = items.into_iter();
                let kind = match items.next() {
                    Some(serde_json::Value::String(kind)) => kind,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Self {
                    kind,
                    args: items.collect(),
                }
            }
            serde_json::Value::String(kind) => Self {
                kind,
                args: Vec::new(),
            },
            other => Self {
                kind: String::new(),
                args: vec![other],
            },
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn is_friend_request(&self) -> bool {
        self.is(FRIEND_REQUEST)
    }

    /// First argument, the usual payload slot
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.args.first()
    }
}

/// Which signal kinds a subscriber wants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignalFilter {
    #[default]
    All,
    Kinds(Vec<String>),
}

impl SignalFilter {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kinds(vec![kind.into()])
    }

    pub fn friend_requests() -> Self {
        Self::kind(FRIEND_REQUEST)
    }

    pub fn accepts(&self, signal: &Signal) -> bool {
        match self {
            SignalFilter::All => true,
            SignalFilter::Kinds(kinds) => kinds.iter().any(|k| signal.is(k)),
        }
    }
}

/// Stream of signals fed by a `signals` subscription
pub type SignalStream = tokio_stream::wrappers::UnboundedReceiverStream<Signal>;
