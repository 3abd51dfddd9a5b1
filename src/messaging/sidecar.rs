use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::CircuitState;

// ============================================================================
// Sidecar Abstraction
// ============================================================================
//
// Everything that crosses a process boundary goes through the sidecar:
// pub/sub, the state store and service invocation. Services depend on this
// trait, not on the HTTP client, so tests can swap in an in-memory double.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    #[error("sidecar unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sidecar returned {status} for {operation}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid sidecar endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("sidecar circuit breaker is open")]
    CircuitOpen,

    #[error("failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored value for '{key}' is not an order: {reason}")]
    MalformedState { key: String, reason: String },
}

/// Raw reply from an invoked app. Any HTTP status counts as delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeResponse {
    pub status: u16,
    pub body: String,
}

impl InvokeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Sidecar: Send + Sync {
    async fn publish_event(&self, pubsub: &str, topic: &str, data: &Value) -> Result<(), SidecarError>;

    async fn save_state(&self, store: &str, key: &str, value: &Value) -> Result<(), SidecarError>;

    /// `Ok(None)` when the key does not exist.
    async fn get_state(&self, store: &str, key: &str) -> Result<Option<Value>, SidecarError>;

    async fn delete_state(&self, store: &str, key: &str) -> Result<(), SidecarError>;

    async fn invoke_method(
        &self,
        app_id: &str,
        method: &str,
        data: &Value,
    ) -> Result<InvokeResponse, SidecarError>;

    async fn circuit_state(&self) -> CircuitState;
}

// ============================================================================
// Pub/Sub wire types
// ============================================================================

/// CloudEvents envelope the sidecar wraps around every delivered message.
/// Only `data` matters to the store; the rest is kept for logging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub pubsubname: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Entry returned from GET /dapr/subscribe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

/// Reply to a delivered message. `Drop` tells the sidecar not to redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Success,
    Drop,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAck {
    pub status: DeliveryStatus,
}
