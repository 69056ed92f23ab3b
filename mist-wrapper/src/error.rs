//! Error types for mist-wrapper

/// A backend request that the runtime reported as failed
///
/// `payload` is the second argument of the runtime's error-first callback,
/// passed through unchanged. It is usually an object with a `code` and a
/// `msg` field, but may be a bare string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Request `{command}` failed: {payload}")]
pub struct TransportError {
    pub command: String,
    pub payload: serde_json::Value,
}

impl TransportError {
    pub fn new(command: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            command: command.into(),
            payload,
        }
    }

    /// Numeric status code carried by the payload, if any
    ///
    /// Accepts `{"code": 304}`, `{"code": 304.0}` and `{"code": "304"}`.
    pub fn code(&self) -> Option<i64> {
        match self.payload.get("code")? {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Failure to bring up the runtime connection
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("Could not reach Wish core at {host}:{port}: {source}")]
    Unreachable {
        host: String,
        port: String,
        source: eyre::Report,
    },
}

/// Identity workflow errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_accepts_numbers_and_numeric_strings() {
        let numeric = TransportError::new("identity.create", serde_json::json!({"code": 304}));
        assert_eq!(numeric.code(), Some(304));

        let float = TransportError::new("identity.create", serde_json::json!({"code": 304.0}));
        assert_eq!(float.code(), Some(304));

        let fractional = TransportError::new("identity.create", serde_json::json!({"code": 304.5}));
        assert_eq!(fractional.code(), None);

        let text = TransportError::new("identity.create", serde_json::json!({"code": "304"}));
        assert_eq!(text.code(), Some(304));

        let bare = TransportError::new("identity.create", serde_json::json!("boom"));
        assert_eq!(bare.code(), None);
    }

    #[test]
    fn not_found_message() {
        assert_eq!(IdentityError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn unreachable_names_host_and_port() {
        let err = OpenError::Unreachable {
            host: "10.0.0.7".to_string(),
            port: "9095".to_string(),
            source: eyre::eyre!("connection refused"),
        };
        let message = err.to_string();
        assert!(message.contains("10.0.0.7:9095"));
        assert!(message.contains("connection refused"));
    }
}
