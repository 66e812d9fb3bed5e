//! Event envelope for pub/sub

use crate::topic::Topic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Topic this event was published on
    pub topic: Topic,

    /// Payload (JSON-serialized)
    pub payload: serde_json::Value,

    /// Publish timestamp
    pub timestamp: DateTime<Utc>,

    /// Correlation ID (for tracing)
    pub correlation_id: Option<String>,
}

impl Event {
    /// Create new event
    pub fn new(topic: Topic, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            topic,
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, correlation_id: String) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Deserialize the payload into a typed value
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> crate::Result<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| crate::Error::Deserialization(e.to_string()))
    }
}
