//! Scoring framework boundary.
//!
//! The types the hosting router exchanges with scoring plugins: the
//! per-request context, the `Scorer` capability trait, and an explicit
//! plugin registry.

mod context;
mod plugin;
mod registry;

pub use context::{PromptMessage, PromptPayload, ScoringContext};
pub use plugin::{ScoreMap, Scorer};
pub use registry::{PluginRegistry, RegistryError, ScorerFactory};
