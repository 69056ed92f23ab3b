//! Connection configuration for the Wish core
//!
//! A [`ConnectionConfig`] names the calling entity and the Wish core it talks
//! to. It is fixed once built: the adapter owns it for its whole lifetime.

/// Default Wish core address
pub const DEFAULT_HOST_ADDRESS: &str = "127.0.0.1";

/// Default Wish core application port
pub const DEFAULT_HOST_PORT: &str = "9094";

/// Environment variable overriding the Wish core address
pub const HOST_ENV: &str = "WISH_CORE_HOST";

/// Environment variable overriding the Wish core port
pub const PORT_ENV: &str = "WISH_CORE_PORT";

/// Entity name plus the Wish core location
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    name: String,
    #[serde(default = "default_host_address")]
    host_address: String,
    #[serde(default = "default_host_port")]
    host_port: String,
}

fn default_host_address() -> String {
    DEFAULT_HOST_ADDRESS.to_string()
}

fn default_host_port() -> String {
    DEFAULT_HOST_PORT.to_string()
}

impl ConnectionConfig {
    pub fn new(
        name: impl Into<String>,
        host_address: impl Into<String>,
        host_port: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host_address: host_address.into(),
            host_port: host_port.into(),
        }
    }

    /// Config for a local Wish core on the default port
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_HOST_ADDRESS, DEFAULT_HOST_PORT)
    }

    /// Start from [`ConnectionConfig::local`], then apply `WISH_CORE_HOST`
    /// and `WISH_CORE_PORT` when they are set and non-empty
    pub fn from_env(name: impl Into<String>) -> Self {
        Self::from_lookup(name, |key| std::env::var(key).ok())
    }

    fn from_lookup<F>(name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::local(name);
        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.trim().is_empty()) {
            config.host_address = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            config.host_port = port.trim().to_string();
        }
        config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host_address(&self) -> &str {
        &self.host_address
    }

    pub fn host_port(&self) -> &str {
        &self.host_port
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.host_address, self.host_port)
    }
}
