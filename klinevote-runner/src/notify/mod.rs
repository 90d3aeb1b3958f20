//! Outgoing message sinks.
//!
//! `MessageSink` is the seam between the orchestrator and the chat channel.
//! `TelegramSink` talks to the Bot API; `LogSink` writes alerts to the log
//! for dry runs.

pub mod log_sink;
pub mod telegram;

pub use log_sink::LogSink;
pub use telegram::TelegramSink;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BotConfig, ConfigError, Secrets, SinkKind};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(String),

    #[error("messaging API returned HTTP {status}: {description}")]
    HttpStatus { status: u16, description: String },

    #[error("message rejected: {0}")]
    Rejected(String),
}

impl NotifyError {
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Network(_) => true,
            NotifyError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            NotifyError::Rejected(_) => false,
        }
    }
}

/// Destination for alert text.
#[async_trait]
pub trait MessageSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;

    /// Release network resources. Called once on shutdown.
    async fn close(&self) {}
}

/// Build the sink selected in `config.notify`. `dry_run` forces `LogSink`.
pub fn build_sink(
    config: &BotConfig,
    secrets: &Secrets,
    dry_run: bool,
) -> Result<Arc<dyn MessageSink>, ConfigError> {
    let notify = &config.notify;
    if dry_run || notify.sink == SinkKind::Log {
        return Ok(Arc::new(LogSink::new()));
    }
    let token = secrets
        .bot_token
        .clone()
        .ok_or_else(|| ConfigError::MissingSecret(notify.bot_token_env.clone()))?;
    let chat_id = secrets
        .chat_id
        .clone()
        .ok_or_else(|| ConfigError::MissingSecret(notify.chat_id_env.clone()))?;
    let sink = TelegramSink::new(
        &notify.base_url,
        token,
        chat_id,
        Duration::from_secs(notify.timeout_secs),
        notify.retry,
    )
    .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;
    Ok(Arc::new(sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(NotifyError::Network("reset".into()).is_transient());
        assert!(NotifyError::HttpStatus {
            status: 429,
            description: "slow down".into()
        }
        .is_transient());
        assert!(NotifyError::HttpStatus {
            status: 502,
            description: String::new()
        }
        .is_transient());
        assert!(!NotifyError::HttpStatus {
            status: 400,
            description: "bad request".into()
        }
        .is_transient());
        assert!(!NotifyError::Rejected("chat not found".into()).is_transient());
    }

    #[test]
    fn dry_run_uses_log_sink() {
        let config = BotConfig::default();
        let sink = build_sink(&config, &Secrets::default(), true).unwrap();
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn telegram_without_token_is_missing_secret() {
        let config = BotConfig::default();
        let err = build_sink(&config, &Secrets::default(), false).err().unwrap();
        assert!(matches!(err, ConfigError::MissingSecret(ref v) if v == "TELEGRAM_BOT_TOKEN"));
    }
}
