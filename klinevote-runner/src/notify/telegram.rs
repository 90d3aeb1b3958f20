//! Telegram Bot API sink (`sendMessage`).
//!
//! Messages go out with `parse_mode = Markdown`. When Telegram cannot parse
//! the markup the same text is resent once as plain text so the alert is
//! not lost.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use klinevote_core::data::{retry_with_backoff, RetryPolicy};

use super::{MessageSink, NotifyError};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_notification: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSink {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSink")
            .field("chat_id", &self.chat_id)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl TelegramSink {
    pub fn new(
        base_url: &str,
        token: String,
        chat_id: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}/sendMessage", base_url.trim_end_matches('/')),
            chat_id,
            retry,
        })
    }

    async fn post(&self, text: &str, parse_mode: Option<&str>) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode,
            disable_notification: false,
        };
        // reqwest errors can embed the URL, which carries the bot token.
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.without_url().to_string()))?;
        let status = resp.status();
        let body: ApiResponse = resp.json().await.unwrap_or_default();
        check_response(status.as_u16(), body)
    }
}

fn check_response(status: u16, body: ApiResponse) -> Result<(), NotifyError> {
    let description = body.description.unwrap_or_default();
    if !(200..300).contains(&status) {
        return Err(NotifyError::HttpStatus {
            status,
            description,
        });
    }
    if !body.ok {
        return Err(NotifyError::Rejected(description));
    }
    Ok(())
}

fn is_markup_error(err: &NotifyError) -> bool {
    matches!(
        err,
        NotifyError::HttpStatus { status: 400, description } if description.contains("parse entities")
    )
}

#[async_trait]
impl MessageSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let this = self;
        let sent = retry_with_backoff(
            &self.retry,
            "telegram.send_message",
            NotifyError::is_transient,
            move || this.post(text, Some("Markdown")),
        )
        .await;
        match sent {
            Err(err) if is_markup_error(&err) => {
                warn!(error = %err, "markdown rejected, resending as plain text");
                retry_with_backoff(
                    &self.retry,
                    "telegram.send_message",
                    NotifyError::is_transient,
                    move || this.post(text, None),
                )
                .await
            }
            other => {
                if other.is_ok() {
                    debug!(chars = text.chars().count(), "message delivered");
                }
                other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> ApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepted_message() {
        assert_eq!(check_response(200, body(r#"{"ok": true, "result": {}}"#)), Ok(()));
    }

    #[test]
    fn http_error_keeps_description() {
        let err = check_response(
            400,
            body(r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#),
        )
        .unwrap_err();
        assert_eq!(
            err,
            NotifyError::HttpStatus {
                status: 400,
                description: "Bad Request: chat not found".into()
            }
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn ok_false_is_rejected() {
        let err = check_response(200, body(r#"{"ok": false, "description": "nope"}"#)).unwrap_err();
        assert_eq!(err, NotifyError::Rejected("nope".into()));
    }

    #[test]
    fn flood_control_is_transient() {
        let err = check_response(429, ApiResponse::default()).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn detects_markup_errors() {
        let err = NotifyError::HttpStatus {
            status: 400,
            description: "Bad Request: can't parse entities: Can't find end of the entity".into(),
        };
        assert!(is_markup_error(&err));
        assert!(!is_markup_error(&NotifyError::Rejected("can't parse entities".into())));
    }

    #[test]
    fn payload_shape() {
        let payload = SendMessage {
            chat_id: "42",
            text: "*hi*",
            parse_mode: Some("Markdown"),
            disable_notification: false,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["parse_mode"], "Markdown");
        assert_eq!(json["disable_notification"], false);

        let plain = SendMessage {
            parse_mode: None,
            ..payload
        };
        assert!(serde_json::to_value(&plain).unwrap().get("parse_mode").is_none());
    }

    #[test]
    fn endpoint_embeds_token() {
        let sink = TelegramSink::new(
            "https://api.telegram.org/",
            "123:abc".into(),
            "42".into(),
            Duration::from_secs(5),
            RetryPolicy::messaging(),
        )
        .unwrap();
        assert_eq!(sink.endpoint, "https://api.telegram.org/bot123:abc/sendMessage");
        assert!(!format!("{sink:?}").contains("123:abc"));
    }
}
