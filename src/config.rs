//! # Configuration Management
//!
//! Configuration for the PROXY protocol connection adapter.
//!
//! The adapter has a single knob: how long an accepted connection may take to
//! deliver its PROXY header before the accept fails. Everything else about the
//! codec is fixed by the wire format.
//!
//! ## Configuration Sources
//! - TOML files via `from_toml_file()`
//! - TOML strings via `from_toml()`
//! - Environment overrides via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - A zero timeout means "wait forever"; production listeners should set a
//!   bound so a silent client cannot pin the accept path indefinitely.

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted by [`ProxyConfig::from_env`], in
/// milliseconds.
pub const ENV_HEADER_READ_TIMEOUT_MS: &str = "PROXY_PROTOCOL_HEADER_READ_TIMEOUT_MS";

/// Recommended header read timeout for production listeners.
pub const RECOMMENDED_HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration consumed by [`ProxyListener`](crate::transport::ProxyListener).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// How long an accepted connection may take to deliver its complete
    /// PROXY header. `Duration::ZERO` disables the deadline.
    #[serde(with = "duration_serde", default)]
    pub header_read_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        // The Go-era default: no deadline unless the operator sets one.
        Self {
            header_read_timeout: Duration::ZERO,
        }
    }
}

impl ProxyConfig {
    /// Build a configuration with the given header read timeout.
    pub fn with_header_read_timeout(timeout: Duration) -> Self {
        Self {
            header_read_timeout: timeout,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProxyError::Config(format!("failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, starting from defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ms) = std::env::var(ENV_HEADER_READ_TIMEOUT_MS) {
            if let Ok(val) = ms.parse::<u64>() {
                config.header_read_timeout = Duration::from_millis(val);
            }
        }

        config
    }

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of validation warnings. Empty list means the
    /// configuration is unobjectionable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.header_read_timeout.is_zero() {
            errors.push(
                "WARNING: header read timeout is disabled - a silent client can stall accept"
                    .to_string(),
            );
        } else if self.header_read_timeout < Duration::from_millis(10) {
            errors.push(format!(
                "Header read timeout very short: {:?} (minimum recommended: 10ms)",
                self.header_read_timeout
            ));
        } else if self.header_read_timeout > Duration::from_secs(300) {
            errors.push(format!(
                "Header read timeout very long: {:?} (maximum recommended: 300s)",
                self.header_read_timeout
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization as milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
