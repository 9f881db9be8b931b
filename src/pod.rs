//! Backend pod identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to a backend serving pod.
///
/// The router's datastore owns pod inventory and lifecycle; this crate only
/// keys scores and cache entries by identity. Pods enter the prefix index
/// through the write-back path and leave it only through capacity eviction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
