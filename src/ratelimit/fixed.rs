//! Fixed-window counter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::backend::WindowLimiter;
use super::key::KeyDeriver;
use super::store::{count_at, Batch, CounterStore};
use super::window::{hits_remaining, validate_hit, Algorithm, RateLimitConfig};
use crate::error::Result;

/// Counts hits in a TTL-bounded counter.
///
/// Every hit increments the counter and re-arms its expiry to the full
/// interval in the same transaction. The window therefore starts with the
/// first hit after the counter lapses and is extended by later hits; it is
/// not aligned to calendar boundaries.
pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    keys: KeyDeriver,
}

impl FixedWindowLimiter {
    /// Create a fixed-window limiter over `store`.
    pub fn new(store: Arc<dyn CounterStore>, keys: KeyDeriver) -> Self {
        Self { store, keys }
    }

    /// Record a hit and return the hits remaining in the current window.
    pub async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64> {
        validate_hit(name, config)?;

        let key = self
            .keys
            .derive(name, config.interval, config.max_hits, Algorithm::FixedWindow);
        let batch = Batch::new()
            .incr(&key)
            .expire(&key, config.fixed_ttl().as_secs());

        let replies = self.store.execute(batch).await?;
        let hits = count_at(&replies, 0)?;
        let remaining = hits_remaining(hits, config.max_hits);

        trace!(
            key = %key,
            hits = hits,
            remaining = remaining,
            "Recorded fixed window hit"
        );
        if hits > config.max_hits {
            debug!(key = %key, hits = hits, limit = config.max_hits, "Fixed window limit exceeded");
        }

        Ok(remaining)
    }
}

#[async_trait]
impl WindowLimiter for FixedWindowLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::FixedWindow
    }

    async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64> {
        FixedWindowLimiter::hit(self, name, config).await
    }
}
