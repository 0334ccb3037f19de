//! # Node Configuration
//!
//! Defaults plus environment overrides for every runtime parameter.
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `SSB_NETWORK_KEY` | `network.network_key` | 64 hex chars |
//! | `SSB_HOPS` | `replication.hop_count` | integer |
//! | `SSB_DEBOUNCE_MS` | `replication.debounce_ms` | integer |
//! | `SSB_FEED_FORMAT` | `replication.feed_format` | `classic`, `gabbygrove`, `bendybutt` |
//! | `SSB_STRICT_FIELD_ORDER` | `verification.strict_field_order` | `true`/`false`/`1`/`0` |
//! | `RUST_LOG` | `logging.filter` | tracing filter directive |

use std::time::Duration;

use shared_crypto::NetworkKey;
use shared_types::FeedFormat;
use ssb_02_feed_formats::CodecConfig;
use ssb_04_trust_graph::{ReplicationConfig as ManagerConfig, DEFAULT_DEBOUNCE, DEFAULT_HOPS};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub replication: ReplicationConfig,
    pub network: NetworkConfig,
    pub verification: VerificationConfig,
    pub logging: LoggingConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Replication configuration.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Follow distance to replicate from.
    pub hop_count: u32,
    /// Log quiescence before the want-list is recomputed.
    pub debounce_ms: u64,
    /// Format of this node's own feed.
    pub feed_format: FeedFormat,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            hop_count: DEFAULT_HOPS,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            feed_format: FeedFormat::Classic,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    /// Private network key. `None` means the main network.
    pub network_key: Option<[u8; 32]>,
}

/// Verification configuration.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Reject classic messages whose fields are out of order.
    pub strict_field_order: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            strict_field_order: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("SSB_NETWORK_KEY") {
            let bytes = hex::decode(value.trim()).map_err(|e| invalid("SSB_NETWORK_KEY", &value, e))?;
            let key: [u8; 32] = bytes
                .try_into()
                .map_err(|_| invalid("SSB_NETWORK_KEY", &value, "must be 32 bytes (64 hex chars)"))?;
            config.network.network_key = Some(key);
        }
        if let Some(value) = lookup("SSB_HOPS") {
            config.replication.hop_count =
                value.trim().parse().map_err(|e| invalid("SSB_HOPS", &value, e))?;
        }
        if let Some(value) = lookup("SSB_DEBOUNCE_MS") {
            config.replication.debounce_ms =
                value.trim().parse().map_err(|e| invalid("SSB_DEBOUNCE_MS", &value, e))?;
        }
        if let Some(value) = lookup("SSB_FEED_FORMAT") {
            config.replication.feed_format = match value.trim() {
                "classic" | "ed25519" => FeedFormat::Classic,
                "gabbygrove" | "ggfeed-v1" => FeedFormat::GabbyGrove,
                "bendybutt" | "bendybutt-v1" => FeedFormat::BendyButt,
                _ => return Err(invalid("SSB_FEED_FORMAT", &value, "unknown feed format")),
            };
        }
        if let Some(value) = lookup("SSB_STRICT_FIELD_ORDER") {
            config.verification.strict_field_order = match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(invalid("SSB_STRICT_FIELD_ORDER", &value, "expected a boolean")),
            };
        }
        if let Some(value) = lookup("RUST_LOG") {
            config.logging.filter = value;
        }

        Ok(config)
    }

    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            network_key: self.network.network_key.map(NetworkKey::new),
            strict_field_order: self.verification.strict_field_order,
        }
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            hop_count: self.replication.hop_count,
            debounce: Duration::from_millis(self.replication.debounce_ms),
        }
    }
}
