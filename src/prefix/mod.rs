//! Prefix-cache affinity scoring.
//!
//! Chained block fingerprinting, the per-model prefix index, and the
//! framework-facing scoring plugin built on top of both.

mod hashing;
mod plugin;
mod store;

pub use hashing::BlockHasher;
pub use plugin::{PrefixCachePlugin, PREFIX_CACHE_PLUGIN_NAME};
pub use store::ModelPrefixStore;
