// ============================================================================
// Messaging - everything that leaves the process goes through the sidecar
// ============================================================================

pub mod dapr;
pub mod order_gateway;
pub mod sidecar;

#[cfg(test)]
pub(crate) mod in_memory;

pub use dapr::DaprClient;
pub use order_gateway::OrderGateway;
pub use sidecar::{CloudEvent, DeliveryAck, DeliveryStatus, SidecarError};
