use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::OrderError;
use super::events::OrderStage;

// ============================================================================
// Order Value Objects
// ============================================================================
//
// Wire names are fixed by the browser page and the other services:
// `order_id`, `creditCard`, `prepTime` and so on. Every field is optional
// on input because the record is passed around as loosely as JSON allows.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OrderItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Order {
    #[serde(default, alias = "orderId", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "creditCard", default, skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drink: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(rename = "prepTime", alias = "prep_time", default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u64>,
}

/// `"items": null` reads as no items.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<OrderItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<OrderItem>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Order {
    /// Decode a request body. `null` and non-objects are rejected up front
    /// so handlers can answer 400 without guessing.
    pub fn from_payload(payload: Value) -> Result<Self, OrderError> {
        match payload {
            Value::Null => Err(OrderError::MissingPayload),
            Value::Object(_) => serde_json::from_value(payload)
                .map_err(|e| OrderError::InvalidPayload(e.to_string())),
            _ => Err(OrderError::NotAnObject),
        }
    }

    /// Decode the `data` member of a pub/sub envelope. Publishers that
    /// serialize the order themselves deliver it as a JSON string.
    pub fn from_event_data(data: Value) -> Result<Self, OrderError> {
        match data {
            Value::String(raw) => {
                let inner: Value = serde_json::from_str(&raw)
                    .map_err(|e| OrderError::InvalidPayload(e.to_string()))?;
                Self::from_payload(inner)
            }
            other => Self::from_payload(other),
        }
    }

    /// Give the order a fresh identifier, replacing any the client sent.
    pub fn assign_new_id(&mut self) -> &str {
        self.order_id.insert(Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> Result<&str, OrderError> {
        self.order_id.as_deref().ok_or(OrderError::MissingOrderId)
    }

    /// Display form of the id for log fields.
    pub fn id_or_unknown(&self) -> &str {
        self.order_id.as_deref().unwrap_or("<unknown>")
    }

    pub fn stage(&self) -> Option<OrderStage> {
        self.event.as_deref().and_then(OrderStage::from_label)
    }

    pub fn set_stage(&mut self, stage: OrderStage) {
        self.event = Some(stage.label().to_string());
    }

    pub fn event_label(&self) -> &str {
        self.event.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
