//! Metric recorder helpers.
//!
//! Thin wrappers over the `metrics` facade so call sites stay one-liners
//! and metric names live in one place.

use metrics::{counter, gauge, histogram};

/// Record one scoring request: how many blocks were hashed and the best
/// match depth across candidates.
pub fn record_score_request(blocks_hashed: usize, best_match_depth: usize) {
    counter!("prefix_affinity_score_requests_total").increment(1);
    histogram!("prefix_affinity_blocks_hashed").record(blocks_hashed as f64);
    histogram!("prefix_affinity_best_match_depth").record(best_match_depth as f64);
}

/// Record fingerprint nodes evicted under capacity pressure.
pub fn record_store_eviction(evicted: usize) {
    counter!("prefix_affinity_store_evictions_total").increment(evicted as u64);
}

/// Record the current node count of one model's shard.
pub fn record_store_size(model: &str, nodes: usize) {
    gauge!("prefix_affinity_store_nodes", "model" => model.to_string()).set(nodes as f64);
}
