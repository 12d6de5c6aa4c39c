use serde::Deserialize;
use std::time::Duration;

/// Floor for the reconnect backoff interval, in milliseconds.
pub const MIN_WAIT_MS: u64 = 16;
/// Ceiling for the reconnect backoff interval, in milliseconds.
pub const MAX_WAIT_MS: u64 = 65_336;

/// Store configuration: the driver connection string plus the backoff
/// bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Driver connection string, e.g.
    /// `DRIVER={FreeTDS};SERVERNAME=test;DATABASE=testdb;UID=app;PWD=app;`.
    pub connection: String,
    /// Minimum reconnect wait in milliseconds.
    #[serde(default = "default_min_wait")]
    pub min_wait: u64,
    /// Maximum reconnect wait in milliseconds.
    #[serde(default = "default_max_wait")]
    pub max_wait: u64,
}

fn default_min_wait() -> u64 {
    MIN_WAIT_MS
}

fn default_max_wait() -> u64 {
    MAX_WAIT_MS
}

/// What `connect` accepts: either a bare driver connection string, or a
/// configuration object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConnectSpec {
    Raw(String),
    Config(StoreConfig),
}

impl ConnectSpec {
    pub fn connection_string(&self) -> &str {
        match self {
            ConnectSpec::Raw(s) => s,
            ConnectSpec::Config(cfg) => &cfg.connection,
        }
    }

    pub fn min_wait(&self) -> Duration {
        Duration::from_millis(match self {
            ConnectSpec::Raw(_) => MIN_WAIT_MS,
            ConnectSpec::Config(cfg) => cfg.min_wait,
        })
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(match self {
            ConnectSpec::Raw(_) => MAX_WAIT_MS,
            ConnectSpec::Config(cfg) => cfg.max_wait,
        })
    }
}

impl From<&str> for ConnectSpec {
    fn from(s: &str) -> Self {
        ConnectSpec::Raw(s.to_string())
    }
}

impl From<String> for ConnectSpec {
    fn from(s: String) -> Self {
        ConnectSpec::Raw(s)
    }
}

impl From<StoreConfig> for ConnectSpec {
    fn from(cfg: StoreConfig) -> Self {
        ConnectSpec::Config(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_spec_uses_defaults() {
        let spec = ConnectSpec::from("DRIVER={FreeTDS};DATABASE=testdb;");
        assert_eq!(spec.connection_string(), "DRIVER={FreeTDS};DATABASE=testdb;");
        assert_eq!(spec.min_wait(), Duration::from_millis(16));
        assert_eq!(spec.max_wait(), Duration::from_millis(65_336));
    }

    #[test]
    fn test_untagged_forms_deserialize() {
        let raw: ConnectSpec = serde_json::from_str("\"DSN=test\"").unwrap();
        assert_eq!(raw.connection_string(), "DSN=test");

        let cfg: ConnectSpec =
            serde_json::from_str(r#"{"connection": "DSN=test", "min_wait": 8}"#).unwrap();
        assert_eq!(cfg.connection_string(), "DSN=test");
        assert_eq!(cfg.min_wait(), Duration::from_millis(8));
        assert_eq!(cfg.max_wait(), Duration::from_millis(65_336));
    }
}
