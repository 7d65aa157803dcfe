// Transport configuration read from environment variables
//
// NUTSOCK_HOST:         Server host name or address (default: localhost)
// NUTSOCK_PORT:         Server TCP port (default: 3493)
// NUTSOCK_TIMEOUT_SECS: Per-operation timeout, negative = block forever (default: infinite)
use nutsock_core::Timeout;
use std::env;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3493;

pub const ENV_HOST: &str = "NUTSOCK_HOST";
pub const ENV_PORT: &str = "NUTSOCK_PORT";
pub const ENV_TIMEOUT_SECS: &str = "NUTSOCK_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Timeout,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: Timeout::Infinite,
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; missing or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup(ENV_PORT)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let timeout = lookup(ENV_TIMEOUT_SECS)
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Timeout::from_secs)
            .unwrap_or(Timeout::Infinite);

        TransportConfig {
            host,
            port,
            timeout,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(TransportConfig::from_lookup(lookup(&[])), TransportConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = TransportConfig::from_lookup(lookup(&[
            (ENV_HOST, "ups.example.net"),
            (ENV_PORT, "13493"),
            (ENV_TIMEOUT_SECS, "7"),
        ]));
        assert_eq!(config.host, "ups.example.net");
        assert_eq!(config.port, 13493);
        assert_eq!(config.timeout.duration(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn garbage_falls_back() {
        let config = TransportConfig::from_lookup(lookup(&[
            (ENV_HOST, "   "),
            (ENV_PORT, "70000"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert_eq!(config, TransportConfig::default());
    }

    #[test]
    fn negative_timeout_blocks_forever() {
        let config = TransportConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "-1")]));
        assert_eq!(config.timeout, Timeout::Infinite);
    }

    #[test]
    fn builder_overrides() {
        let config = TransportConfig::default()
            .with_host("10.0.0.5")
            .with_port(3500)
            .with_timeout(Timeout::from_millis(750));
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 3500);
        assert!(config.timeout.is_finite());
    }
}
