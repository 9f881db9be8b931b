//! Plugin configuration, validation, and environment loading.
//!
//! All values can be loaded from `PREFIX_AFFINITY_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without
//! crashing; structurally invalid configuration (zero bounds) is rejected
//! once at plugin build time via [`PrefixCacheConfig::validate`].
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PREFIX_AFFINITY_BLOCK_SIZE` | 64 | Characters hashed per block |
//! | `PREFIX_AFFINITY_MAX_BLOCKS` | 128 | Max fingerprints per prompt |
//! | `PREFIX_AFFINITY_STORE_MAX_ENTRIES` | 50000 | Max fingerprint nodes per model |
//! | `PREFIX_AFFINITY_STORE_MAX_PODS_PER_ENTRY` | 8 | Max pods per fingerprint node |

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors detected when validating construction-time configuration.
///
/// These are operator errors and fail plugin build-out immediately; there is
/// no per-request error path in this crate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("block_size must be greater than zero")]
    ZeroBlockSize,

    #[error("max_blocks_to_match must be greater than zero")]
    ZeroMaxBlocks,

    #[error("store max_entries_per_model must be greater than zero")]
    ZeroStoreCapacity,

    #[error("store max_pods_per_entry must be greater than zero")]
    ZeroPodFanout,
}

/// Capacity bounds for the prefix index store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixStoreConfig {
    /// Maximum distinct fingerprint nodes tracked per model. Exceeding the
    /// bound evicts least-recently-used nodes within that model.
    pub max_entries_per_model: usize,
    /// Maximum pods recorded per fingerprint node. Exceeding the bound drops
    /// the least-recently-associated pod.
    pub max_pods_per_entry: usize,
}

impl Default for PrefixStoreConfig {
    fn default() -> Self {
        Self {
            max_entries_per_model: 50_000,
            max_pods_per_entry: 8,
        }
    }
}

impl PrefixStoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries_per_model == 0 {
            return Err(ConfigError::ZeroStoreCapacity);
        }
        if self.max_pods_per_entry == 0 {
            return Err(ConfigError::ZeroPodFanout);
        }
        Ok(())
    }
}

/// Configuration for the prefix-cache scoring plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixCacheConfig {
    /// Characters hashed per block; mirrors the inference engine's KV block
    /// paging so matches line up with reusable cache state.
    pub block_size: usize,
    /// Cap on fingerprints computed per prompt. Blocks past the cap are not
    /// hashed at all.
    pub max_blocks_to_match: usize,
    /// Store capacity bounds.
    pub store: PrefixStoreConfig,
}

impl Default for PrefixCacheConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            max_blocks_to_match: 128,
            store: PrefixStoreConfig::default(),
        }
    }
}

impl PrefixCacheConfig {
    /// Validate construction-time bounds. Called once at plugin build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.max_blocks_to_match == 0 {
            return Err(ConfigError::ZeroMaxBlocks);
        }
        self.store.validate()
    }

    /// Load configuration from `PREFIX_AFFINITY_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            block_size: parse_env_usize("PREFIX_AFFINITY_BLOCK_SIZE", defaults.block_size),
            max_blocks_to_match: parse_env_usize(
                "PREFIX_AFFINITY_MAX_BLOCKS",
                defaults.max_blocks_to_match,
            ),
            store: PrefixStoreConfig {
                max_entries_per_model: parse_env_usize(
                    "PREFIX_AFFINITY_STORE_MAX_ENTRIES",
                    defaults.store.max_entries_per_model,
                ),
                max_pods_per_entry: parse_env_usize(
                    "PREFIX_AFFINITY_STORE_MAX_PODS_PER_ENTRY",
                    defaults.store.max_pods_per_entry,
                ),
            },
        }
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_env_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "invalid environment value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
