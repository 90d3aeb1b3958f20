//! Market data access: provider trait, retry policy, circuit breaker.

pub mod circuit_breaker;
pub mod provider;
pub mod retry;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, MarketDataProvider};
pub use retry::{retry_with_backoff, RetryPolicy};
