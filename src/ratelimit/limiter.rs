//! Rate limiter facade.

use std::sync::Arc;

use tracing::debug;

use super::backend::WindowLimiter;
use super::fixed::FixedWindowLimiter;
use super::key::KeyDeriver;
use super::sliding::SlidingWindowLimiter;
use super::store::CounterStore;
use super::window::{Algorithm, RateLimitConfig};
use crate::error::Result;

/// Single entry point for recording hits.
///
/// The algorithm is fixed when the limiter is built. Fixed-window and
/// sliding-window limiters keep their state under different keys, so
/// switching algorithms starts every resource from a clean slate.
///
/// This struct is cheap to share across tasks behind an `Arc`.
pub struct RateLimiter {
    inner: Box<dyn WindowLimiter>,
}

impl RateLimiter {
    /// Create a limiter running `algorithm` against `store`.
    pub fn new(store: Arc<dyn CounterStore>, keys: KeyDeriver, algorithm: Algorithm) -> Self {
        debug!(algorithm = %algorithm, prefix = %keys.prefix(), "Creating rate limiter");

        let inner: Box<dyn WindowLimiter> = match algorithm {
            Algorithm::FixedWindow => Box::new(FixedWindowLimiter::new(store, keys)),
            Algorithm::SlidingWindow => Box::new(SlidingWindowLimiter::new(store, keys)),
        };
        Self { inner }
    }

    /// The algorithm backing this limiter.
    pub fn algorithm(&self) -> Algorithm {
        self.inner.algorithm()
    }

    /// Record a hit against `name`.
    ///
    /// Returns the number of further hits allowed; `0` means the resource is
    /// rate limited. Errors are never turned into an allow decision.
    pub async fn hit(&self, name: &str, config: &RateLimitConfig) -> Result<u64> {
        self.inner.hit(name, config).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}
