//! Polling loop: schedule → fetch → vote → track → dispatch.
//!
//! A single task drives every timeframe sequentially. The scheduler decides
//! which timeframes are due; each due timeframe is fetched, its close is
//! confirmed, the majority vote runs on the last completed candle and
//! BUY/SELL results are recorded in the tracker. Due timeframes are grouped
//! into a short and a long batch, and a batch produces one message only when
//! at least one of its timeframes has a fresh BUY or SELL.
//!
//! Entry points:
//! - `run_cycle()`: one pass over the due timeframes
//! - `run(shutdown)`: cycles until the shutdown future resolves
//! - `analyze_once(tf)`: one-off analysis that leaves schedule and tracker alone

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use klinevote_core::clock::Clock;
use klinevote_core::data::{DataError, MarketDataProvider};
use klinevote_core::domain::{last_completed, Candle, Horizon, Timeframe};
use klinevote_core::schedule::{CloseCheck, Scheduler};
use klinevote_core::strategy::MajorityVote;
use klinevote_core::tracker::SignalTracker;

use crate::config::{BotConfig, BotSection, ConfigError};
use crate::format::{indicator_summary, MessageFormatter};
use crate::notify::{MessageSink, NotifyError};
use crate::result::{BatchReport, CycleReport, TimeframeOutcome, TimeframeResult};

/// Why one timeframe could not be analyzed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{timeframe}: got {got} candles, need at least {need}")]
    InsufficientData {
        timeframe: Timeframe,
        got: usize,
        need: usize,
    },

    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),
}

/// Errors that stop the polling loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data provider rejected the credentials: {0}")]
    Credentials(DataError),
}

pub struct Orchestrator {
    bot: BotSection,
    provider: Arc<dyn MarketDataProvider>,
    sink: Arc<dyn MessageSink>,
    clock: Arc<dyn Clock>,
    strategy: MajorityVote,
    scheduler: Scheduler,
    tracker: SignalTracker,
    formatter: MessageFormatter,
    /// Set when the provider reports an error no retry can fix.
    fatal: Option<DataError>,
}

impl Orchestrator {
    pub fn new(
        config: &BotConfig,
        provider: Arc<dyn MarketDataProvider>,
        sink: Arc<dyn MessageSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = MajorityVote::new(&config.indicators, config.strategy.clone())?;
        Ok(Self {
            bot: config.bot.clone(),
            provider,
            sink,
            clock,
            strategy,
            scheduler: Scheduler::new(&config.bot.timeframes, config.schedule.clone()),
            tracker: SignalTracker::new(),
            formatter: MessageFormatter::new(&config.display),
            fatal: None,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.bot.symbol
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn tracker(&self) -> &SignalTracker {
        &self.tracker
    }

    pub fn strategy(&self) -> &MajorityVote {
        &self.strategy
    }

    /// Arm every timeframe that has no schedule yet from a two-candle fetch.
    /// Failures are logged and retried on the next cycle.
    pub async fn initialize_schedules(&mut self) -> Vec<Timeframe> {
        let mut armed = Vec::new();
        for tf in self.scheduler.uninitialized() {
            let fetched = self.provider.get_klines(&self.bot.symbol, tf, 2).await;
            match fetched {
                Ok(candles) if self.scheduler.initialize(tf, &candles) => armed.push(tf),
                Ok(_) => warn!(timeframe = %tf, "provider returned no candles, schedule not armed"),
                Err(err) => {
                    warn!(timeframe = %tf, error = %err, "cannot arm schedule");
                    self.note_fatal(&err);
                }
            }
        }
        if !armed.is_empty() {
            info!(timeframes = ?armed, "schedules armed");
        }
        armed
    }

    /// One pass: arm missing schedules, analyze every due timeframe and
    /// dispatch at most one message per batch.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport {
            initialized: self.initialize_schedules().await,
            batches: Vec::new(),
        };

        let due = self.scheduler.due_timeframes(self.clock.now_ms());
        for horizon in [Horizon::Short, Horizon::Long] {
            let batch: Vec<Timeframe> =
                due.iter().copied().filter(|tf| tf.horizon() == horizon).collect();
            if batch.is_empty() {
                continue;
            }
            debug!(?horizon, timeframes = ?batch, "analyzing batch");

            let mut outcomes = Vec::with_capacity(batch.len());
            for tf in batch {
                let outcome = self.analyze_timeframe(tf).await;
                outcomes.push((tf, outcome));
            }
            let mut batch = BatchReport {
                horizon,
                outcomes,
                dispatched: false,
            };
            if batch.has_actionable() {
                batch.dispatched = self.dispatch_batch(&batch).await;
            }
            report.batches.push(batch);
        }
        report
    }

    /// Fetch, confirm the close, vote and update the schedule for one due
    /// timeframe.
    pub async fn analyze_timeframe(&mut self, tf: Timeframe) -> TimeframeOutcome {
        let candles = match self.fetch_candles(tf).await {
            Ok(candles) => candles,
            Err(err) => return self.give_up(tf, err),
        };
        let Some(completed) = last_completed(&candles).copied() else {
            let err = AnalysisError::InsufficientData {
                timeframe: tf,
                got: candles.len(),
                need: 2,
            };
            return self.give_up(tf, err);
        };

        match self.scheduler.confirm_close(tf, completed.close_time) {
            CloseCheck::Confirmed => {}
            CloseCheck::Stale { retry_count } => {
                info!(
                    timeframe = %tf,
                    retry_count,
                    last_close = completed.close_time,
                    "provider has not published the closed candle yet"
                );
                return TimeframeOutcome::Stale { retry_count };
            }
            CloseCheck::Skipped { skipped_close } => {
                return TimeframeOutcome::Skipped { skipped_close };
            }
        }

        let result = self.evaluate(tf, &candles, &completed);
        if result.is_actionable() {
            let changed = self
                .tracker
                .record(&self.bot.symbol, tf, result.signal, result.timestamp);
            info!(
                timeframe = %tf,
                signal = %result.signal,
                buy = result.breakdown.buy,
                sell = result.breakdown.sell,
                changed,
                "signal"
            );
        } else {
            info!(
                timeframe = %tf,
                indicators = %indicator_summary(&result.snapshot),
                "neutral"
            );
        }
        self.scheduler.mark_analyzed(tf, completed.close_time);
        TimeframeOutcome::Analyzed(result)
    }

    /// Analyze `tf` right now without touching the schedule or the tracker.
    pub async fn analyze_once(&self, tf: Timeframe) -> Result<TimeframeResult, AnalysisError> {
        let candles = self.fetch_candles(tf).await?;
        let completed = last_completed(&candles).copied().ok_or(
            AnalysisError::InsufficientData {
                timeframe: tf,
                got: candles.len(),
                need: 2,
            },
        )?;
        Ok(self.evaluate(tf, &candles, &completed))
    }

    pub async fn send_startup_notice(&self) -> Result<(), NotifyError> {
        let text = self.formatter.startup_message(
            &self.bot.symbol,
            self.scheduler.timeframes(),
            self.strategy.config().quorum,
            self.provider.name(),
            self.clock.now_ms(),
        );
        self.sink.send_message(&text).await
    }

    pub async fn send_error_notice(&self, error: &str) -> Result<(), NotifyError> {
        let text = self
            .formatter
            .error_message(&self.bot.symbol, error, self.clock.now_ms());
        self.sink.send_message(&text).await
    }

    /// Poll until `shutdown` resolves or the provider fails permanently.
    /// Shutdown is honoured both between cycles and while a cycle is
    /// waiting on the network. Network resources are released on every
    /// exit path.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), RunError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            symbol = %self.bot.symbol,
            timeframes = ?self.scheduler.timeframes(),
            provider = self.provider.name(),
            sink = self.sink.name(),
            "polling started"
        );
        if self.bot.send_startup_message {
            if let Err(err) = self.send_startup_notice().await {
                warn!(error = %err, "startup notice not delivered");
            }
        }

        let outcome = loop {
            // Dropping a cycle mid-fetch leaves the schedule where the last
            // completed step put it.
            let report = tokio::select! {
                report = self.run_cycle() => report,
                _ = &mut shutdown => {
                    info!("shutdown requested during cycle");
                    break Ok(());
                }
            };
            if let Some(err) = self.fatal.take() {
                break Err(RunError::Credentials(err));
            }
            let delay = self.scheduler.next_poll_delay(self.clock.now_ms());
            debug!(
                messages = report.messages_sent(),
                delay_ms = delay.as_millis() as u64,
                "cycle complete"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
            }
        };

        if let Err(err) = &outcome {
            error!(error = %err, "polling stopped");
            if self.bot.send_error_message {
                if let Err(notify_err) = self.send_error_notice(&err.to_string()).await {
                    warn!(error = %notify_err, "error notice not delivered");
                }
            }
        }
        self.provider.close().await;
        self.sink.close().await;
        outcome
    }

    async fn fetch_candles(&self, tf: Timeframe) -> Result<Vec<Candle>, AnalysisError> {
        let limit = self.bot.fetch_limit_for(tf);
        let candles = self.provider.get_klines(&self.bot.symbol, tf, limit).await?;
        let need = self.bot.min_candles_for(tf) + 1;
        if candles.len() < need {
            return Err(AnalysisError::InsufficientData {
                timeframe: tf,
                got: candles.len(),
                need,
            });
        }
        Ok(candles)
    }

    fn evaluate(&self, tf: Timeframe, candles: &[Candle], completed: &Candle) -> TimeframeResult {
        let outcome = self.strategy.vote(candles);
        TimeframeResult {
            timeframe: tf,
            signal: outcome.signal,
            price: completed.close,
            timestamp: completed.open_time.div_euclid(1000),
            close_time: completed.close_time,
            breakdown: outcome.breakdown,
            snapshot: outcome.snapshot,
        }
    }

    /// Count a failed attempt against the retry budget.
    fn give_up(&mut self, tf: Timeframe, err: AnalysisError) -> TimeframeOutcome {
        warn!(timeframe = %tf, error = %err, "analysis attempt failed");
        if let AnalysisError::Fetch(data_err) = &err {
            self.note_fatal(data_err);
        }
        match self.scheduler.defer(tf) {
            CloseCheck::Skipped { skipped_close } => TimeframeOutcome::Skipped { skipped_close },
            _ => TimeframeOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }

    fn note_fatal(&mut self, err: &DataError) {
        if matches!(err, DataError::AuthenticationRequired(_)) {
            self.fatal = Some(err.clone());
        }
    }

    async fn dispatch_batch(&self, batch: &BatchReport) -> bool {
        let timeframes: Vec<Timeframe> = self
            .scheduler
            .timeframes()
            .iter()
            .copied()
            .filter(|tf| tf.horizon() == batch.horizon)
            .collect();
        let results: Vec<TimeframeResult> = batch.results().cloned().collect();
        let text = self.formatter.batch_message(
            batch.horizon,
            &self.bot.symbol,
            &timeframes,
            &results,
            &self.tracker,
            self.clock.now_ms(),
        );
        match self.sink.send_message(&text).await {
            Ok(()) => {
                info!(horizon = ?batch.horizon, sink = self.sink.name(), "alert sent");
                true
            }
            Err(err) => {
                error!(horizon = ?batch.horizon, error = %err, "alert not delivered");
                false
            }
        }
    }
}
