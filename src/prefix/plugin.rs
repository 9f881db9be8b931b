//! Prefix-cache scoring plugin.
//!
//! Ranks candidate pods by how many leading prompt blocks they already hold
//! in their KV cache. The plugin itself is stateless between calls: hashing
//! parameters are fixed at build time and all mutable state lives in the
//! shared [`ModelPrefixStore`].

use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigError, PrefixCacheConfig};
use crate::framework::{ScoreMap, Scorer, ScoringContext};
use crate::pod::PodRef;
use crate::telemetry;

use super::hashing::BlockHasher;
use super::store::ModelPrefixStore;

/// Registration name for the prefix-cache scorer.
pub const PREFIX_CACHE_PLUGIN_NAME: &str = "prefix-cache";

/// Scores pods by longest matching fingerprint-chain prefix.
pub struct PrefixCachePlugin {
    name: String,
    hasher: BlockHasher,
    store: Arc<ModelPrefixStore>,
}

impl PrefixCachePlugin {
    /// Build from validated configuration and a shared store handle.
    ///
    /// Configuration errors surface here, once, at plugin build; scoring
    /// itself has no error path.
    pub fn new(
        config: &PrefixCacheConfig,
        store: Arc<ModelPrefixStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            name: PREFIX_CACHE_PLUGIN_NAME.to_string(),
            hasher: BlockHasher::new(config.block_size, config.max_blocks_to_match),
            store,
        })
    }

    /// Shared store handle, for callers that drive the write-back path
    /// directly rather than through [`Scorer::on_pod_selected`].
    pub fn store(&self) -> &Arc<ModelPrefixStore> {
        &self.store
    }
}

impl Scorer for PrefixCachePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, ctx: &ScoringContext, pods: &[PodRef]) -> Option<ScoreMap> {
        let prompt = ctx.prompt.flattened_text();
        if prompt.is_empty() {
            // Nothing to match on: report absence, not a map of zeros, so
            // the aggregator treats this plugin as not participating.
            return None;
        }
        let fingerprints = self.hasher.hash_prompt(&ctx.model, &prompt);
        let depths = self.store.lookup(&ctx.model, &fingerprints, pods);
        let best = depths.values().copied().max().unwrap_or(0);
        debug!(
            model = %ctx.model,
            blocks = fingerprints.len(),
            candidates = pods.len(),
            best_match = best,
            "prefix-cache score"
        );
        telemetry::record_score_request(fingerprints.len(), best);
        Some(depths)
    }

    fn on_pod_selected(&self, ctx: &ScoringContext, pod: &PodRef) {
        let prompt = ctx.prompt.flattened_text();
        if prompt.is_empty() {
            return;
        }
        let fingerprints = self.hasher.hash_prompt(&ctx.model, &prompt);
        self.store.add(&ctx.model, &fingerprints, pod);
    }
}
