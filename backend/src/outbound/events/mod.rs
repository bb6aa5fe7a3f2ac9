//! Event publisher that writes domain notifications to the log.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::ports::{EventPublishError, EventPublisher};

/// Emits each event as a structured `info` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), EventPublishError> {
        info!(target: "user_service::events", %topic, %payload, "domain event");
        Ok(())
    }
}
