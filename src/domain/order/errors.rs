// ============================================================================
// Order Payload Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrderError {
    #[error("Order payload is missing")]
    MissingPayload,

    #[error("Order payload is not a JSON object")]
    NotAnObject,

    #[error("Invalid order payload: {0}")]
    InvalidPayload(String),

    #[error("Order has no order_id")]
    MissingOrderId,
}
