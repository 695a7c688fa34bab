//! Sliding-window log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, trace};
use uuid::Uuid;

use super::backend::WindowLimiter;
use super::key::KeyDeriver;
use super::store::{count_at, Batch, CounterStore};
use super::window::{hits_remaining, validate_hit, Algorithm, RateLimitConfig};
use crate::error::Result;

/// Position of the `ZCARD` reply in the sliding window transaction.
const CARDINALITY_REPLY: usize = 2;

/// Keeps one timestamped entry per hit and counts the entries inside the
/// trailing interval.
///
/// Each hit runs `ZADD`, `ZREMRANGEBYSCORE` and `ZCARD` in one transaction,
/// all against the same captured timestamp: the new hit is counted, and
/// entries older than the interval are gone before the count is taken.
pub struct SlidingWindowLimiter {
    store: Arc<dyn CounterStore>,
    keys: KeyDeriver,
}

impl SlidingWindowLimiter {
    /// Create a sliding-window limiter over `store`.
    pub fn new(store: Arc<dyn CounterStore>, keys: KeyDeriver) -> Self {
        Self { store, keys }
    }

    /// Record a hit and return the hits remaining in the trailing interval.
    pub async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64> {
        validate_hit(name, config)?;

        let key = self
            .keys
            .derive(name, config.interval, config.max_hits, Algorithm::SlidingWindow);

        let now = Utc::now().timestamp_millis();
        let span = i64::try_from(config.sliding_span().as_millis()).unwrap_or(i64::MAX);
        let oldest_kept = now.saturating_sub(span);

        let batch = Batch::new()
            .zadd(&key, now, log_member(now))
            .zrem_range_by_score_below(&key, oldest_kept)
            .zcard(&key);

        let replies = self.store.execute(batch).await?;
        let hits = count_at(&replies, CARDINALITY_REPLY)?;
        let remaining = hits_remaining(hits, config.max_hits);

        trace!(
            key = %key,
            now = now,
            hits = hits,
            remaining = remaining,
            "Recorded sliding window hit"
        );
        if hits > config.max_hits {
            debug!(key = %key, hits = hits, limit = config.max_hits, "Sliding window limit exceeded");
        }

        Ok(remaining)
    }
}

/// Unique log member for a hit at `now`.
///
/// Sorted sets deduplicate by member, so two hits sharing a member would be
/// counted once. The random v4 suffix keeps concurrent hits in the same
/// millisecond apart.
fn log_member(now: i64) -> String {
    format!("{now}-{}", Uuid::new_v4())
}

#[async_trait]
impl WindowLimiter for SlidingWindowLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindow
    }

    async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64> {
        SlidingWindowLimiter::hit(self, name, config).await
    }
}
