//! Process configuration read from `LOGGING_MANIFESTS_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::server::ServeOptions;

/// Prefix of every configuration variable.
pub const ENV_PREFIX: &str = "LOGGING_MANIFESTS_";

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings of the provider binary.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Fixed bind address. An ephemeral 127.0.0.1 port is used when unset.
    #[serde(default)]
    pub listen_addr: Option<SocketAddr>,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Default log filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            listen_addr: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl LaunchConfig {
    /// Read the configuration from the process environment.
    pub fn try_from_env() -> Result<Self, ProviderError> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| ProviderError::Configuration(e.to_string()))
    }

    /// Server options derived from this configuration.
    pub fn serve_options(&self) -> ServeOptions {
        ServeOptions::new().with_shutdown_timeout(Duration::from_secs(self.shutdown_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<LaunchConfig, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, LaunchConfig::default());
        assert_eq!(config.serve_options().shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("LOGGING_MANIFESTS_LISTEN_ADDR", "127.0.0.1:7000"),
            ("LOGGING_MANIFESTS_SHUTDOWN_TIMEOUT_SECS", "5"),
            ("LOGGING_MANIFESTS_LOG_LEVEL", "debug"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr, Some("127.0.0.1:7000".parse().unwrap()));
        assert_eq!(config.serve_options().shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_timeout() {
        let err = from_pairs(&[("LOGGING_MANIFESTS_SHUTDOWN_TIMEOUT_SECS", "soon")]);
        assert!(err.is_err());
    }
}
