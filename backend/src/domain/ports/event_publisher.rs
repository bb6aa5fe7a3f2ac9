//! Driven port for domain event notifications.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event sinks.
    pub enum EventPublishError {
        /// The sink could not accept the event.
        Unavailable { message: String } => "event sink unavailable: {message}",
    }
}

/// Notification sink receiving `(topic, payload)` pairs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), EventPublishError>;
}

/// In-memory sink recording every published event.
#[derive(Debug, Default)]
pub struct FixtureEventPublisher {
    events: Mutex<Vec<(String, Value)>>,
}

impl FixtureEventPublisher {
    /// Events published so far, oldest first.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Topics published so far, oldest first.
    pub fn topics(&self) -> Vec<String> {
        self.events().into_iter().map(|(topic, _)| topic).collect()
    }
}

#[async_trait]
impl EventPublisher for FixtureEventPublisher {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), EventPublishError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| EventPublishError::unavailable("fixture event log poisoned"))?;
        events.push((topic.to_owned(), payload));
        Ok(())
    }
}
