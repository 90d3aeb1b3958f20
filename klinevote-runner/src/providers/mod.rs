//! Concrete market data providers.

pub mod synthetic;
pub mod twelve_data;

pub use synthetic::SyntheticProvider;
pub use twelve_data::TwelveDataProvider;

use std::sync::Arc;
use std::time::Duration;

use klinevote_core::clock::Clock;
use klinevote_core::data::{CircuitBreaker, MarketDataProvider};

use crate::config::{BotConfig, ConfigError, ProviderKind, Secrets};

/// Build the provider selected in `config.data`.
pub fn build_provider(
    config: &BotConfig,
    secrets: &Secrets,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn MarketDataProvider>, ConfigError> {
    let data = &config.data;
    match data.provider {
        ProviderKind::Synthetic => Ok(Arc::new(SyntheticProvider::new(clock))),
        ProviderKind::TwelveData => {
            let api_key = secrets
                .api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingSecret(data.api_key_env.clone()))?;
            let breaker = Arc::new(CircuitBreaker::new(
                Duration::from_secs(data.breaker_cooldown_secs),
                data.breaker_failure_threshold,
            ));
            let provider = TwelveDataProvider::new(
                &data.base_url,
                api_key,
                Duration::from_secs(data.timeout_secs),
                data.retry,
                breaker,
            )
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;
            Ok(Arc::new(provider))
        }
    }
}
