//! Twelve Data `time_series` provider.
//!
//! Candles come back newest first with prices encoded as strings; they are
//! reversed to oldest first before returning. HTTP 403 trips the circuit
//! breaker at once, 429 and 5xx count as failures toward tripping it.
//! Transient errors are retried with bounded exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use klinevote_core::data::{
    retry_with_backoff, CircuitBreaker, DataError, MarketDataProvider, RetryPolicy,
};
use klinevote_core::domain::{Candle, Timeframe};

/// Error bodies are cut to this many characters.
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub(crate) struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

pub struct TwelveDataProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for TwelveDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwelveDataProvider")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl TwelveDataProvider {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        retry: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("klinevote/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry,
            breaker,
        })
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn fetch_once(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        self.breaker.check()?;
        let interval = interval_param(timeframe)?;
        let url = format!("{}/time_series", self.base_url);
        let outputsize = limit.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("outputsize", outputsize.as_str()),
                ("apikey", self.api_key.as_str()),
                ("timezone", "UTC"),
                ("format", "JSON"),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            self.breaker.trip();
            return Err(DataError::CircuitBreakerTripped {
                remaining_secs: self.breaker.remaining_cooldown().as_secs(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(
                "Twelve Data rejected the API key".into(),
            ));
        }
        if !status.is_success() {
            if status.is_server_error() {
                self.breaker.record_failure();
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body: TimeSeriesResponse = resp.json().await.map_err(|e| {
            DataError::ResponseFormat(format!("invalid time_series body for {symbol}: {e}"))
        })?;
        match parse_time_series(body, timeframe) {
            Ok(candles) => {
                self.breaker.record_success();
                debug!(symbol, timeframe = %timeframe, count = candles.len(), "candles fetched");
                Ok(candles)
            }
            Err(err @ DataError::RateLimited { .. }) => {
                self.breaker.record_failure();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl MarketDataProvider for TwelveDataProvider {
    fn name(&self) -> &str {
        "twelve_data"
    }

    async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let this = self;
        retry_with_backoff(
            &self.retry,
            "twelve_data.time_series",
            DataError::is_transient,
            move || this.fetch_once(symbol, timeframe, limit),
        )
        .await
    }
}

/// Twelve Data's interval names.
pub fn interval_param(timeframe: Timeframe) -> Result<&'static str, DataError> {
    match timeframe {
        Timeframe::M1 => Ok("1min"),
        Timeframe::M5 => Ok("5min"),
        Timeframe::M15 => Ok("15min"),
        Timeframe::M30 => Ok("30min"),
        Timeframe::H1 => Ok("1h"),
        Timeframe::H2 => Ok("2h"),
        Timeframe::H4 => Ok("4h"),
        Timeframe::D1 => Ok("1day"),
        Timeframe::M3 => Err(DataError::UnsupportedTimeframe(timeframe)),
    }
}

/// Convert a decoded response into oldest-first candles.
pub(crate) fn parse_time_series(
    body: TimeSeriesResponse,
    timeframe: Timeframe,
) -> Result<Vec<Candle>, DataError> {
    if body.status.as_deref() == Some("error") {
        let message = body.message.unwrap_or_else(|| "unknown error".into());
        return Err(match body.code {
            Some(429) => DataError::RateLimited {
                retry_after_secs: 60,
            },
            Some(401) | Some(403) => DataError::AuthenticationRequired(message),
            _ => DataError::Api(message),
        });
    }
    let values = body
        .values
        .ok_or_else(|| DataError::ResponseFormat("missing `values` array".into()))?;

    let interval = timeframe.interval_ms();
    let mut candles = values
        .iter()
        .map(|v| {
            let open_time = parse_datetime(&v.datetime)?;
            Ok(Candle {
                open_time,
                open: parse_price("open", &v.open)?,
                high: parse_price("high", &v.high)?,
                low: parse_price("low", &v.low)?,
                close: parse_price("close", &v.close)?,
                volume: match &v.volume {
                    Some(raw) => parse_price("volume", raw)?,
                    None => 0.0,
                },
                close_time: open_time + interval,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;
    candles.reverse();
    Ok(candles)
}

fn parse_datetime(raw: &str) -> Result<i64, DataError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| DataError::ResponseFormat(format!("unparseable datetime '{raw}'")))
}

fn parse_price(field: &str, raw: &str) -> Result<f64, DataError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormat(format!("{field} is not a number: '{raw}'")))
}

fn request_error(err: reqwest::Error) -> DataError {
    if err.is_timeout() {
        DataError::Timeout(err.to_string())
    } else {
        DataError::Network(err.to_string())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_BODY_CHARS).collect()
}
