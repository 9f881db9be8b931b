//! Cache-affinity scoring for LLM inference request routing.
//!
//! Scores candidate backend pods by how much of a prompt's leading content
//! they already hold in their local KV cache, so a router can bias placement
//! toward pods that can reuse cached computation instead of recomputing it.
//!
//! # Components
//!
//! - [`prefix::BlockHasher`]: chained xxHash64 fingerprints over fixed-size
//!   prompt blocks, seeded per model
//! - [`prefix::ModelPrefixStore`]: per-model, capacity-bounded index mapping
//!   fingerprint chains to the pods observed to hold them
//! - [`prefix::PrefixCachePlugin`]: the framework-facing scorer gluing the
//!   two together
//!
//! The hosting framework calls [`framework::Scorer::score`] once per routing
//! decision and [`framework::Scorer::on_pod_selected`] once placement is
//! confirmed, so later requests sharing the prefix are biased toward the
//! serving pod.

pub mod config;
pub mod framework;
pub mod pod;
pub mod prefix;
pub mod telemetry;

pub use config::{ConfigError, PrefixCacheConfig, PrefixStoreConfig};
pub use framework::{
    PluginRegistry, PromptMessage, PromptPayload, RegistryError, ScoreMap, Scorer, ScoringContext,
};
pub use pod::PodRef;
pub use prefix::{BlockHasher, ModelPrefixStore, PrefixCachePlugin, PREFIX_CACHE_PLUGIN_NAME};
