//! Configuration loading and management.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Settings fail semantic validation.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Client connection settings.
    pub client: Settings,
    /// Channel to join once the server signals connect-complete (001).
    pub channel: String,
}

/// Client connection settings. Immutable after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server hostname (e.g., "irc.libera.chat").
    pub host: String,
    /// Server port (1-65535).
    pub port: u16,
    /// Nickname, also used as the username during identification.
    pub nick: String,
    /// Reconnect policy.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

/// Bounds for the reconnect loop.
///
/// The client restarts resolve → connect → identify on any transport
/// failure; these fields bound how often and for how long, instead of
/// retrying forever.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Consecutive failed connect attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds.
    pub initial_delay_secs: u64,
    /// Ceiling for the exponential backoff, in seconds.
    pub max_delay_secs: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_secs: 1,
            max_delay_secs: 30,
        }
    }
}

impl ReconnectPolicy {
    /// Backoff delay before retry number `attempt` (1-based): exponential
    /// doubling from the initial delay, capped at the ceiling.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63);
        let secs = self
            .initial_delay_secs
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_secs);
        Duration::from_secs(secs)
    }
}

impl Settings {
    /// Validate settings that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be in 1-65535"));
        }
        if self.nick.is_empty() {
            return Err(ConfigError::Invalid("nick must not be empty"));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.client.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(
            r##"
            channel = "#corvid"

            [client]
            host = "irc.example.com"
            port = 6667
            nick = "corvid"
            "##,
        )
        .unwrap();

        assert_eq!(config.client.host, "irc.example.com");
        assert_eq!(config.client.port, 6667);
        assert_eq!(config.client.reconnect.max_attempts, 10);
        assert_eq!(config.channel, "#corvid");
    }

    #[test]
    fn test_parse_reconnect_overrides() {
        let settings: Settings = toml::from_str(
            r#"
            host = "irc.example.com"
            port = 6667
            nick = "corvid"

            [reconnect]
            max_attempts = 3
            initial_delay_secs = 2
            max_delay_secs = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.reconnect.max_attempts, 3);
        assert_eq!(settings.reconnect.delay_for(1), Duration::from_secs(2));
        assert_eq!(settings.reconnect.delay_for(2), Duration::from_secs(4));
        // Capped at the ceiling from the third retry on
        assert_eq!(settings.reconnect.delay_for(5), Duration::from_secs(8));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let settings = Settings {
            host: "irc.example.com".into(),
            port: 0,
            nick: "corvid".into(),
            reconnect: ReconnectPolicy::default(),
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_backoff_is_monotonic_until_cap() {
        let policy = ReconnectPolicy::default();
        let mut last = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= last);
            assert!(delay <= Duration::from_secs(policy.max_delay_secs));
            last = delay;
        }
    }
}
