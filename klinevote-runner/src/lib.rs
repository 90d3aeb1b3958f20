//! klinevote runner: everything that talks to the outside world.
//!
//! This crate builds on `klinevote-core` to provide:
//! - TOML configuration with environment-resolved secrets
//! - The polling orchestrator (schedule, fetch, vote, track, dispatch)
//! - Alert formatting for the messaging channel
//! - Twelve Data and synthetic market data providers
//! - Telegram and log message sinks

pub mod config;
pub mod format;
pub mod notify;
pub mod orchestrator;
pub mod providers;
pub mod result;

pub use config::{BotConfig, ConfigError, ProviderKind, Secrets, SinkKind};
pub use format::MessageFormatter;
pub use notify::{build_sink, LogSink, MessageSink, NotifyError, TelegramSink};
pub use orchestrator::{AnalysisError, Orchestrator, RunError};
pub use providers::{build_provider, SyntheticProvider, TwelveDataProvider};
pub use result::{BatchReport, CycleReport, TimeframeOutcome, TimeframeResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn orchestrator_is_send_sync() {
        assert_send::<Orchestrator>();
        assert_sync::<Orchestrator>();
    }

    #[test]
    fn providers_and_sinks_are_send_sync() {
        assert_send::<TwelveDataProvider>();
        assert_sync::<TwelveDataProvider>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
        assert_send::<TelegramSink>();
        assert_sync::<TelegramSink>();
        assert_send::<LogSink>();
        assert_sync::<LogSink>();
    }

    #[test]
    fn config_and_results_are_send_sync() {
        assert_send::<BotConfig>();
        assert_sync::<BotConfig>();
        assert_send::<CycleReport>();
        assert_sync::<CycleReport>();
        assert_send::<AnalysisError>();
        assert_sync::<AnalysisError>();
    }
}
