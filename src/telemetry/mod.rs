//! Logging and metrics for the affinity scorer.
//!
//! Structured logging via `tracing` and counters/gauges via the `metrics`
//! facade; the hosting process picks the subscriber and recorder backends.

mod logging;
mod recorders;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use recorders::{record_score_request, record_store_eviction, record_store_size};
