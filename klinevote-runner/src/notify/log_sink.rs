use async_trait::async_trait;
use tracing::info;

use super::{MessageSink, NotifyError};

/// Writes every alert to the log at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        info!(target: "klinevote::alert", "\n{text}");
        Ok(())
    }
}
