//! Alert text for the messaging channel.
//!
//! Messages use Telegram's legacy Markdown (`*bold*`). One message is built
//! per batch: a header with symbol, local time and price, then one block per
//! timeframe of the batch. Timeframes with a fresh BUY/SELL get the full vote
//! breakdown; the rest show the last recorded signal and how long ago it was.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use klinevote_core::domain::{Horizon, Signal, Timeframe};
use klinevote_core::strategy::{IndicatorKind, IndicatorSnapshot};
use klinevote_core::tracker::SignalTracker;

use crate::config::DisplaySection;
use crate::result::TimeframeResult;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone)]
pub struct MessageFormatter {
    offset: FixedOffset,
    timezone_label: String,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::utc()
    }
}

impl MessageFormatter {
    pub fn new(display: &DisplaySection) -> Self {
        let offset = FixedOffset::east_opt(display.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            timezone_label: display.timezone_label.clone(),
        }
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            timezone_label: "UTC".into(),
        }
    }

    /// `dd.mm.yyyy HH:MM:SS (label)` in the display offset.
    pub fn local_time(&self, epoch_ms: i64) -> String {
        match DateTime::from_timestamp_millis(epoch_ms) {
            Some(utc) => format!(
                "{} ({})",
                utc.with_timezone(&self.offset).format("%d.%m.%Y %H:%M:%S"),
                self.timezone_label
            ),
            None => format!("{epoch_ms} ms"),
        }
    }

    /// Alert for one batch. `timeframes` lists every configured timeframe of
    /// the batch's horizon; `results` holds the ones analyzed this cycle.
    pub fn batch_message(
        &self,
        horizon: Horizon,
        symbol: &str,
        timeframes: &[Timeframe],
        results: &[TimeframeResult],
        tracker: &SignalTracker,
        now_ms: i64,
    ) -> String {
        let mut out = String::new();
        match horizon {
            Horizon::Short => {
                let _ = writeln!(out, "⚡ *{symbol} Short-Term Signals*");
            }
            Horizon::Long => {
                let _ = writeln!(out, "{RULE}");
                let _ = writeln!(out, "📈 *{symbol} Long-Term Signals*");
                let _ = writeln!(out, "{RULE}");
            }
        }
        let _ = writeln!(out, "🕐 {}", self.local_time(now_ms));
        let price = results
            .iter()
            .find(|r| r.is_actionable())
            .or_else(|| results.first())
            .map(|r| r.price);
        if let Some(price) = price {
            let _ = writeln!(out, "💰 Price: ${price:.4}");
        }

        for &tf in timeframes {
            out.push('\n');
            let emoji = timeframe_emoji(tf);
            match results.iter().find(|r| r.timeframe == tf && r.is_actionable()) {
                Some(result) => {
                    let _ = writeln!(out, "{emoji} *{tf}*: {}", signal_banner(result.signal));
                    out.push_str(&self.vote_breakdown(result));
                }
                None => {
                    let (last, at) = tracker.get_last(symbol, tf);
                    if last.is_neutral() || at == 0 {
                        let _ = writeln!(out, "{emoji} *{tf}*: No signal yet");
                    } else {
                        let ago = format_time_ago(now_ms.div_euclid(1000), at);
                        let _ = writeln!(out, "{emoji} *{tf}*: Last {last}: {ago}");
                    }
                }
            }
        }
        out.trim_end().to_string()
    }

    /// Tally line followed by one tree line per indicator.
    pub fn vote_breakdown(&self, result: &TimeframeResult) -> String {
        let b = &result.breakdown;
        let mut out = format!(
            "📊 Votes: {}🟢 {}🔴 {}⚪ (Min: {})\n",
            b.buy, b.sell, b.neutral, b.quorum
        );
        let last = b.votes.len().saturating_sub(1);
        for (i, vote) in b.votes.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            let _ = writeln!(
                out,
                "   {branch} {} {:<12}: {}",
                signal_emoji(vote.signal),
                vote.kind.label(),
                indicator_value(vote.kind, &result.snapshot)
            );
        }
        out
    }

    pub fn startup_message(
        &self,
        symbol: &str,
        timeframes: &[Timeframe],
        quorum: usize,
        provider: &str,
        now_ms: i64,
    ) -> String {
        let labels: Vec<&str> = timeframes.iter().map(|tf| tf.as_str()).collect();
        format!(
            "🤖 *klinevote started*\n🕐 {}\n📌 Symbol: {symbol}\n⏱ Timeframes: {}\n🗳 Quorum: {quorum}/8\n📡 Data: {provider}",
            self.local_time(now_ms),
            labels.join(", ")
        )
    }

    pub fn error_message(&self, symbol: &str, error: &str, now_ms: i64) -> String {
        format!(
            "🚨 *klinevote stopped*\n🕐 {}\n📌 Symbol: {symbol}\n❌ {error}",
            self.local_time(now_ms)
        )
    }
}

/// One-line `label value | label value` summary of every indicator.
pub fn indicator_summary(snapshot: &IndicatorSnapshot) -> String {
    IndicatorKind::ALL
        .iter()
        .map(|&kind| format!("{} {}", kind.label(), indicator_value(kind, snapshot)))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Coarse elapsed time between two epoch-second timestamps.
pub fn format_time_ago(now_secs: i64, then_secs: i64) -> String {
    let diff = (now_secs - then_secs).max(0);
    if diff < 3_600 {
        format!("{} min ago", (diff / 60).max(1))
    } else if diff < 86_400 {
        format!("{}h ago", diff / 3_600)
    } else {
        format!("{}d ago", diff / 86_400)
    }
}

pub fn timeframe_emoji(tf: Timeframe) -> &'static str {
    match tf {
        Timeframe::M1 | Timeframe::M3 | Timeframe::M5 => "⏱",
        Timeframe::M15 => "🔥",
        Timeframe::M30 => "⌛",
        Timeframe::H1 => "⏰",
        Timeframe::H2 => "🕑",
        Timeframe::H4 => "📈",
        Timeframe::D1 => "🎯",
    }
}

pub fn signal_emoji(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "🟢",
        Signal::Sell => "🔴",
        Signal::Neutral => "⚪",
    }
}

fn signal_banner(signal: Signal) -> String {
    let e = signal_emoji(signal);
    format!("{e}{e} *{signal}* {e}{e}")
}

fn indicator_value(kind: IndicatorKind, s: &IndicatorSnapshot) -> String {
    let one = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"));
    match kind {
        IndicatorKind::Cmo => one(s.cmo),
        IndicatorKind::Stochastic => one(s.stoch_k),
        IndicatorKind::Rsi => one(s.rsi),
        IndicatorKind::StochRsi => one(s.stoch_rsi_k),
        IndicatorKind::WilliamsR => one(s.williams_r),
        IndicatorKind::Macd => match (s.macd, s.macd_signal) {
            (Some(m), Some(sig)) => {
                let rel = if m > sig {
                    '>'
                } else if m < sig {
                    '<'
                } else {
                    '='
                };
                format!("{m:.3} {rel} {sig:.3}")
            }
            _ => "n/a".into(),
        },
        IndicatorKind::Fisher => match (s.fisher, s.fisher_trigger) {
            (Some(f), Some(t)) => format!("{f:.2} / {t:.2}"),
            (Some(f), None) => format!("{f:.2}"),
            _ => "n/a".into(),
        },
        IndicatorKind::Coral => match s.coral_trend {
            Some(t) if t > 0.0 => "Bullish ↗️".into(),
            Some(t) if t < 0.0 => "Bearish ↘️".into(),
            Some(_) => "Neutral →".into(),
            None => "n/a".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klinevote_core::strategy::MajorityVote;

    fn buy_result(tf: Timeframe) -> TimeframeResult {
        let snapshot = IndicatorSnapshot {
            cmo: Some(-75.0),
            stoch_k: Some(4.2),
            rsi: Some(9.9),
            macd: Some(-1.5),
            macd_signal: Some(-1.25),
            stoch_rsi_k: Some(50.0),
            williams_r: Some(-95.0),
            fisher: Some(-2.1),
            fisher_trigger: Some(-1.8),
            coral_trend: Some(-1.0),
            ..IndicatorSnapshot::default()
        };
        let strategy = MajorityVote::default();
        let breakdown = strategy.classify(&snapshot);
        TimeframeResult {
            timeframe: tf,
            signal: strategy.decide(&breakdown),
            price: 2345.5,
            timestamp: 1_700_000_000,
            close_time: 1_700_000_300_000,
            breakdown,
            snapshot,
        }
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(format_time_ago(1_000, 1_000), "1 min ago");
        assert_eq!(format_time_ago(1_000 + 59 * 60, 1_000), "59 min ago");
        assert_eq!(format_time_ago(1_000 + 3_600, 1_000), "1h ago");
        assert_eq!(format_time_ago(1_000 + 23 * 3_600, 1_000), "23h ago");
        assert_eq!(format_time_ago(1_000 + 3 * 86_400, 1_000), "3d ago");
        assert_eq!(format_time_ago(0, 500), "1 min ago");
    }

    #[test]
    fn local_time_applies_offset() {
        let fmt = MessageFormatter::new(&DisplaySection::default());
        assert_eq!(fmt.local_time(0), "01.01.1970 03:00:00 (TR)");
        assert_eq!(MessageFormatter::utc().local_time(0), "01.01.1970 00:00:00 (UTC)");
    }

    #[test]
    fn breakdown_lists_every_indicator() {
        let result = buy_result(Timeframe::M5);
        assert_eq!(result.signal, Signal::Buy);
        let text = MessageFormatter::utc().vote_breakdown(&result);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("📊 Votes: 4🟢 3🔴 1⚪ (Min: 4)"));
        assert!(lines[1].contains("🟢 CMO"));
        assert!(lines[1].ends_with(": -75.0"));
        assert!(lines[4].contains("-1.500 < -1.250"));
        assert!(lines[7].contains("-2.10 / -1.80"));
        assert!(lines[8].starts_with("   └─ 🔴 Coral Trend"));
        assert!(lines[8].ends_with("Bearish ↘️"));
    }

    #[test]
    fn batch_shows_fresh_and_remembered_signals() {
        let mut tracker = SignalTracker::new();
        tracker.record("XAU/USD", Timeframe::M15, Signal::Sell, 1_700_000_000 - 7_200);
        let result = buy_result(Timeframe::M5);
        let text = MessageFormatter::utc().batch_message(
            Horizon::Short,
            "XAU/USD",
            &[Timeframe::M5, Timeframe::M15, Timeframe::H1],
            &[result],
            &tracker,
            1_700_000_000_000,
        );
        assert!(text.starts_with("⚡ *XAU/USD Short-Term Signals*"));
        assert!(text.contains("💰 Price: $2345.5000"));
        assert!(text.contains("⏱ *5m*: 🟢🟢 *BUY* 🟢🟢"));
        assert!(text.contains("🔥 *15m*: Last SELL: 2h ago"));
        assert!(text.contains("⏰ *1h*: No signal yet"));
    }

    #[test]
    fn long_batch_has_ruled_header() {
        let text = MessageFormatter::utc().batch_message(
            Horizon::Long,
            "XAU/USD",
            &[Timeframe::H4],
            &[buy_result(Timeframe::H4)],
            &SignalTracker::new(),
            0,
        );
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(RULE));
        assert_eq!(lines.next(), Some("📈 *XAU/USD Long-Term Signals*"));
        assert_eq!(lines.next(), Some(RULE));
    }

    #[test]
    fn neutral_result_falls_back_to_tracker() {
        let mut result = buy_result(Timeframe::M5);
        result.signal = Signal::Neutral;
        let text = MessageFormatter::utc().batch_message(
            Horizon::Short,
            "XAU/USD",
            &[Timeframe::M5],
            &[result],
            &SignalTracker::new(),
            0,
        );
        assert!(text.contains("⏱ *5m*: No signal yet"));
        assert!(!text.contains("📊 Votes"));
    }

    #[test]
    fn summary_joins_all_indicators() {
        let line = indicator_summary(&buy_result(Timeframe::M5).snapshot);
        assert_eq!(line.split(" | ").count(), 8);
        assert!(line.starts_with("CMO -75.0 | Stochastic 4.2"));
    }

    #[test]
    fn missing_values_render_as_na() {
        let s = IndicatorSnapshot::default();
        assert_eq!(indicator_value(IndicatorKind::Rsi, &s), "n/a");
        assert_eq!(indicator_value(IndicatorKind::Macd, &s), "n/a");
        assert_eq!(indicator_value(IndicatorKind::Coral, &s), "n/a");
    }
}
