//! Rate limiting algorithms and the counter stores behind them.

mod backend;
mod fixed;
mod key;
mod limiter;
mod memory;
mod redis_store;
mod sliding;
mod store;
mod window;

pub use backend::WindowLimiter;
pub use fixed::FixedWindowLimiter;
pub use key::KeyDeriver;
pub use limiter::RateLimiter;
pub use memory::InMemoryCounterStore;
pub use redis_store::RedisCounterStore;
pub use sliding::SlidingWindowLimiter;
pub use store::{Batch, Command, CounterStore, Reply};
pub use window::{hits_remaining, Algorithm, RateLimitConfig};
