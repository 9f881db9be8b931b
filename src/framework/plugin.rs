//! Scoring plugin capability trait.

use std::collections::HashMap;

use crate::pod::PodRef;

use super::context::ScoringContext;

/// Per-pod score map returned by a scorer.
///
/// When present, the map covers every candidate pod the scorer was given;
/// a pod with no affinity scores 0 rather than being absent, so downstream
/// aggregation can rely on total coverage of the candidate set.
pub type ScoreMap = HashMap<PodRef, usize>;

/// A scoring plugin: ranks candidate pods for one routing decision.
///
/// Implementations must be safe to call concurrently from many in-flight
/// requests; any shared state they consult carries its own synchronization.
pub trait Scorer: Send + Sync {
    /// Name used for registration and reports.
    fn name(&self) -> &str;

    /// Score the candidates. `None` means the plugin did not participate in
    /// this decision (e.g. no prompt text to match on) and must be treated
    /// as absent by the aggregator, not as all-zero scores.
    fn score(&self, ctx: &ScoringContext, pods: &[PodRef]) -> Option<ScoreMap>;

    /// Called once the framework has confirmed `pod` is serving the request,
    /// so the plugin can fold the placement back into its own state.
    fn on_pod_selected(&self, _ctx: &ScoringContext, _pod: &PodRef) {}
}
