use crate::core::events::NotificationEvent;
use crate::plugins::registry::NotifySink;
use async_trait::async_trait;
use tracing::{info, warn};

/// Mirrors every notification into the log.
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifySink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, event: &NotificationEvent, text: &str) -> anyhow::Result<()> {
        let kind = event.kind();
        let text = text.replace('\n', " | ");
        if event.is_alarming() {
            warn!(event = ?kind, "{text}");
        } else {
            info!(event = ?kind, "{text}");
        }
        Ok(())
    }
}
