//! Storage key derivation.

use super::window::Algorithm;

/// Derives the storage key for a limiter.
///
/// Every input takes part in the key, so limiters that differ in name,
/// interval, threshold or algorithm never share a counter, while repeated
/// calls with the same parameters always land on the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDeriver {
    prefix: String,
}

impl KeyDeriver {
    /// Create a deriver that namespaces every key under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the key for one limiter configuration.
    ///
    /// Format: `{prefix}:limiter:{algorithm}:{name}:{interval}:{max_hits}`.
    /// The algorithm sits before the name and the two numeric fields after it,
    /// so a name containing `:` cannot be confused with another configuration.
    pub fn derive(&self, name: &str, interval: u32, max_hits: u64, algorithm: Algorithm) -> String {
        format!(
            "{}:limiter:{}:{}:{}:{}",
            self.prefix,
            algorithm.as_str(),
            name,
            interval,
            max_hits
        )
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new("hitwindow")
    }
}
