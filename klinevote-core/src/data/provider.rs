//! Market data provider trait and structured error types.
//!
//! `MarketDataProvider` abstracts over candle sources (Twelve Data, the
//! synthetic random walk, test doubles) so the orchestrator never knows
//! which one it talks to.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candle, Timeframe};

/// Structured error types for data operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("provider rejected the request: {0}")]
    Api(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("timeframe {0} is not supported by this provider")]
    UnsupportedTimeframe(Timeframe),

    #[error("hard stop: provider blocked for another {remaining_secs}s (circuit breaker tripped)")]
    CircuitBreakerTripped { remaining_secs: u64 },
}

impl DataError {
    /// Errors worth retrying after a backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::Timeout(_) | DataError::RateLimited { .. } => true,
            DataError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Source of OHLC candles.
///
/// `get_klines` returns up to `limit` candles, oldest first, the last one
/// being the candle that is still forming.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError>;

    /// Release network resources. Called once on shutdown.
    async fn close(&self) {}
}
