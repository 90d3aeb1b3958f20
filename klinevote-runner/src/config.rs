//! Bot configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Secrets are never stored in the file: the config names the environment
//! variables that hold them and `Secrets::from_env` resolves them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use klinevote_core::data::RetryPolicy;
use klinevote_core::domain::Timeframe;
use klinevote_core::indicators::IndicatorParams;
use klinevote_core::schedule::ScheduleConfig;
use klinevote_core::strategy::{StrategyError, VoteConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy config: {0}")]
    Strategy(#[from] StrategyError),

    #[error("environment variable {0} is not set")]
    MissingSecret(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub symbol: String,
    /// Analyzed timeframes, in the order they are processed and displayed.
    pub timeframes: Vec<Timeframe>,
    /// Completed candles required before a timeframe is analyzed.
    pub min_candles: usize,
    pub min_candles_per_timeframe: BTreeMap<Timeframe, usize>,
    /// Candles requested per fetch; defaults to `min_candles + 1`.
    pub fetch_limit: Option<usize>,
    pub send_startup_message: bool,
    pub send_error_message: bool,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            symbol: "XAU/USD".into(),
            timeframes: vec![Timeframe::M5, Timeframe::M15, Timeframe::H1, Timeframe::H4],
            min_candles: 100,
            min_candles_per_timeframe: BTreeMap::new(),
            fetch_limit: None,
            send_startup_message: true,
            send_error_message: true,
        }
    }
}

impl BotSection {
    pub fn min_candles_for(&self, tf: Timeframe) -> usize {
        self.min_candles_per_timeframe
            .get(&tf)
            .copied()
            .unwrap_or(self.min_candles)
    }

    /// Candles to request for `tf`: the active candle plus the required history.
    pub fn fetch_limit_for(&self, tf: Timeframe) -> usize {
        let needed = self.min_candles_for(tf) + 1;
        self.fetch_limit.map_or(needed, |limit| limit.max(needed))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    TwelveData,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub provider: ProviderKind,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
    pub breaker_cooldown_secs: u64,
    pub breaker_failure_threshold: u32,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            provider: ProviderKind::TwelveData,
            base_url: "https://api.twelvedata.com".into(),
            api_key_env: "TWELVE_DATA_API_KEY".into(),
            timeout_secs: 10,
            retry: RetryPolicy::default(),
            breaker_cooldown_secs: 15 * 60,
            breaker_failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    #[default]
    Telegram,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub sink: SinkKind,
    pub base_url: String,
    pub bot_token_env: String,
    pub chat_id_env: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            sink: SinkKind::Telegram,
            base_url: "https://api.telegram.org".into(),
            bot_token_env: "TELEGRAM_BOT_TOKEN".into(),
            chat_id_env: "TELEGRAM_CHAT_ID".into(),
            timeout_secs: 10,
            retry: RetryPolicy::messaging(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Offset from UTC for timestamps in messages.
    pub utc_offset_minutes: i32,
    pub timezone_label: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 180,
            timezone_label: "TR".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub bot: BotSection,
    pub schedule: ScheduleConfig,
    pub data: DataSection,
    pub notify: NotifySection,
    pub indicators: IndicatorParams,
    pub strategy: VoteConfig,
    pub display: DisplaySection,
}

impl BotConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bot = &self.bot;
        if bot.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("bot.symbol is empty".into()));
        }
        if bot.timeframes.is_empty() {
            return Err(ConfigError::Invalid("bot.timeframes is empty".into()));
        }
        for (i, tf) in bot.timeframes.iter().enumerate() {
            if bot.timeframes[..i].contains(tf) {
                return Err(ConfigError::Invalid(format!(
                    "bot.timeframes lists {tf} twice"
                )));
            }
        }
        if let Some(tf) = bot.timeframes.iter().find(|tf| bot.min_candles_for(**tf) < 2) {
            return Err(ConfigError::Invalid(format!(
                "min_candles for {tf} must be at least 2"
            )));
        }
        if let Some(limit) = bot.fetch_limit {
            if let Some(tf) = bot
                .timeframes
                .iter()
                .find(|tf| limit < bot.min_candles_for(**tf) + 1)
            {
                return Err(ConfigError::Invalid(format!(
                    "bot.fetch_limit ({limit}) is below min_candles + 1 for {tf}"
                )));
            }
        }
        if self.schedule.max_retries == 0 {
            return Err(ConfigError::Invalid("schedule.max_retries must be >= 1".into()));
        }
        if self.schedule.close_buffer_ms < 0 {
            return Err(ConfigError::Invalid(
                "schedule.close_buffer_ms must not be negative".into(),
            ));
        }
        if self.display.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "display.utc_offset_minutes out of range: {}",
                self.display.utc_offset_minutes
            )));
        }
        self.indicators
            .validate()
            .map_err(|e| ConfigError::Strategy(e.into()))?;
        self.strategy.validate()?;
        Ok(())
    }
}

/// Credentials resolved from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub api_key: Option<String>,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("api_key", &mask(&self.api_key))
            .field("bot_token", &mask(&self.bot_token))
            .field("chat_id", &mask(&self.chat_id))
            .finish()
    }
}

impl Secrets {
    /// Read every secret the config names; missing ones stay `None`.
    pub fn from_env(config: &BotConfig) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(config: &BotConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(&config.data.api_key_env),
            bot_token: get(&config.notify.bot_token_env),
            chat_id: get(&config.notify.chat_id_env),
        }
    }

    /// Fail when the selected provider or sink needs a secret that is missing.
    pub fn require_for(&self, config: &BotConfig) -> Result<(), ConfigError> {
        if config.data.provider == ProviderKind::TwelveData && self.api_key.is_none() {
            return Err(ConfigError::MissingSecret(config.data.api_key_env.clone()));
        }
        if config.notify.sink == SinkKind::Telegram {
            if self.bot_token.is_none() {
                return Err(ConfigError::MissingSecret(config.notify.bot_token_env.clone()));
            }
            if self.chat_id.is_none() {
                return Err(ConfigError::MissingSecret(config.notify.chat_id_env.clone()));
            }
        }
        Ok(())
    }
}
