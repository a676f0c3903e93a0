//! Node configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PORT` | `8080` | HTTP listen port |
//! | `PEERS` | empty | Comma-separated `host:port` peer addresses |
//! | `REPLICATION_TIMEOUT_MS` | unset | Per-request timeout for peer delivery |

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings for one peerdoc node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub port: u16,
    /// Peer addresses in the order given. Duplicates are kept.
    pub peers: Vec<String>,
    pub replication_timeout: Option<Duration>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            peers: Vec::new(),
            replication_timeout: None,
        }
    }
}

impl NodeConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let peers = lookup("PEERS")
            .map(|raw| parse_peers(&raw))
            .unwrap_or_default();

        let replication_timeout = match non_empty(lookup("REPLICATION_TIMEOUT_MS")) {
            Some(raw) => Some(Duration::from_millis(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidValue { name: "REPLICATION_TIMEOUT_MS", value: raw })?,
            )),
            None => None,
        };

        Ok(Self { port, peers, replication_timeout })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated peer list, trimming entries and dropping blanks.
pub fn parse_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<NodeConfig, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();

        NodeConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), NodeConfig::default());
        assert_eq!(NodeConfig::default().port, 8080);
    }

    #[test]
    fn reads_port_and_peers() {
        let cfg = config(&[("PORT", "9001"), ("PEERS", "localhost:9002, localhost:9003")]).unwrap();

        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.peers, vec!["localhost:9002", "localhost:9003"]);
    }

    #[test]
    fn peer_list_drops_blanks_and_keeps_duplicates() {
        assert_eq!(parse_peers(" a:1 ,, b:2, ,a:1,"), vec!["a:1", "b:2", "a:1"]);
        assert!(parse_peers("").is_empty());
        assert!(parse_peers(" , ").is_empty());
    }

    #[test]
    fn reads_replication_timeout() {
        let cfg = config(&[("REPLICATION_TIMEOUT_MS", "250")]).unwrap();

        assert_eq!(cfg.replication_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert_eq!(
            config(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::InvalidValue { name: "PORT", value: "eighty".to_string() }
        );
        assert!(config(&[("REPLICATION_TIMEOUT_MS", "-5")]).is_err());
    }
}
