use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::order::OrderError;
use crate::messaging::SidecarError;

// ============================================================================
// HTTP error mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidOrder(#[from] OrderError),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Order {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Sidecar(#[from] SidecarError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidOrder(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Sidecar(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Sidecar(e) = self {
            tracing::error!(error = %e, "Request failed on sidecar call");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}
