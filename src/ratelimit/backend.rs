//! Rate limiter trait shared by the fixed-window and sliding-window algorithms.

use async_trait::async_trait;

use super::window::{Algorithm, RateLimitConfig};
use crate::error::Result;

/// Trait for rate limiter algorithms.
///
/// Both algorithms honour the same contract so the [`RateLimiter`] facade can
/// hold either one.
///
/// [`RateLimiter`]: super::RateLimiter
#[async_trait]
pub trait WindowLimiter: Send + Sync {
    /// The algorithm this limiter implements.
    fn algorithm(&self) -> Algorithm;

    /// Record one hit against `name` and return the hits remaining.
    ///
    /// Zero means the limit has been reached or exceeded.
    async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64>;
}
