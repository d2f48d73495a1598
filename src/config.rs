//! Centralized application configuration
//!
//! Single source of truth for network and engine settings, loaded from
//! environment variables with sensible defaults and validation at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::TargetKind;

/// Default values for configuration
mod defaults {
    // Network defaults
    pub fn http_port() -> u16 {
        8080
    }
    pub fn http_bind_addr() -> String {
        "0.0.0.0".to_string()
    }

    // Engine defaults
    pub fn call_timeout_secs() -> u64 {
        5
    }
    pub fn phase_timeout_secs() -> u64 {
        60
    }
    pub fn jitter_min_ms() -> u64 {
        1_000
    }
    pub fn jitter_max_ms() -> u64 {
        10_000
    }
    pub fn max_in_flight() -> usize {
        16
    }
}

/// Configuration loading/validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required configuration {key}: {hint}")]
    MissingRequired {
        /// Environment variable name.
        key: String,
        /// How to fix it.
        hint: String,
    },
    /// An environment variable is set to something unusable.
    #[error("invalid configuration {key}={value}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// Offending value (secrets are replaced with `<redacted>`).
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Network-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// HTTP port the inject API listens on
    #[serde(default = "defaults::http_port")]
    pub http_port: u16,
    /// HTTP server bind address
    #[serde(default = "defaults::http_bind_addr")]
    pub http_bind_addr: String,
}

impl NetworkConfig {
    /// Load network configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            http_port: env_parse("FLAGBOT_HTTP_PORT", defaults::http_port())?,
            http_bind_addr: std::env::var("FLAGBOT_HTTP_BIND_ADDR")
                .unwrap_or_else(|_| defaults::http_bind_addr()),
        })
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_port: defaults::http_port(),
            http_bind_addr: defaults::http_bind_addr(),
        }
    }
}

/// Verification-engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout for a single network call made by a transport client (seconds)
    #[serde(default = "defaults::call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Hard ceiling on a whole inject or verify phase (seconds); enforced by
    /// the engine independently of adapter-level timeouts
    #[serde(default = "defaults::phase_timeout_secs")]
    pub phase_timeout_secs: u64,
    /// Lower bound of the randomized inject-to-verify delay (milliseconds)
    #[serde(default = "defaults::jitter_min_ms")]
    pub jitter_min_ms: u64,
    /// Upper bound of the randomized inject-to-verify delay (milliseconds)
    #[serde(default = "defaults::jitter_max_ms")]
    pub jitter_max_ms: u64,
    /// Cap on simultaneous in-flight injection attempts
    #[serde(default = "defaults::max_in_flight")]
    pub max_in_flight: usize,
    /// Adapter used when a request does not name a target type
    #[serde(default)]
    pub default_target: TargetKind,
}

impl EngineConfig {
    /// Load engine configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let default_target = match std::env::var("FLAGBOT_DEFAULT_TARGET") {
            Ok(raw) => raw
                .parse::<TargetKind>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "FLAGBOT_DEFAULT_TARGET".to_string(),
                    value: raw.clone(),
                    reason: e,
                })?,
            Err(_) => TargetKind::default(),
        };
        let config = Self {
            call_timeout_secs: env_parse(
                "FLAGBOT_CALL_TIMEOUT_SECS",
                defaults::call_timeout_secs(),
            )?,
            phase_timeout_secs: env_parse(
                "FLAGBOT_PHASE_TIMEOUT_SECS",
                defaults::phase_timeout_secs(),
            )?,
            jitter_min_ms: env_parse("FLAGBOT_JITTER_MIN_MS", defaults::jitter_min_ms())?,
            jitter_max_ms: env_parse("FLAGBOT_JITTER_MAX_MS", defaults::jitter_max_ms())?,
            max_in_flight: env_parse("FLAGBOT_MAX_IN_FLIGHT", defaults::max_in_flight())?,
            default_target,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jitter_min_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FLAGBOT_JITTER_MIN_MS".to_string(),
                value: "0".to_string(),
                reason: "the anti-fingerprinting delay must never be zero".to_string(),
            });
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(ConfigError::InvalidValue {
                key: "FLAGBOT_JITTER_MAX_MS".to_string(),
                value: self.jitter_max_ms.to_string(),
                reason: format!("must be >= FLAGBOT_JITTER_MIN_MS ({})", self.jitter_min_ms),
            });
        }
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FLAGBOT_CALL_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                reason: "network calls must be bounded".to_string(),
            });
        }
        if self.phase_timeout_secs < self.call_timeout_secs {
            return Err(ConfigError::InvalidValue {
                key: "FLAGBOT_PHASE_TIMEOUT_SECS".to_string(),
                value: self.phase_timeout_secs.to_string(),
                reason: format!(
                    "must be >= FLAGBOT_CALL_TIMEOUT_SECS ({})",
                    self.call_timeout_secs
                ),
            });
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FLAGBOT_MAX_IN_FLIGHT".to_string(),
                value: "0".to_string(),
                reason: "at least one attempt must be allowed in flight".to_string(),
            });
        }
        Ok(())
    }

    /// Timeout applied to every single transport call
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Hard ceiling applied to a whole inject/verify phase
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: defaults::call_timeout_secs(),
            phase_timeout_secs: defaults::phase_timeout_secs(),
            jitter_min_ms: defaults::jitter_min_ms(),
            jitter_max_ms: defaults::jitter_max_ms(),
            max_in_flight: defaults::max_in_flight(),
            default_target: TargetKind::default(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network settings
    pub network: NetworkConfig,
    /// Engine settings
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load all configuration sections from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            network: NetworkConfig::load()?,
            engine: EngineConfig::load()?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}
