use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::utils::CircuitState;

// ============================================================================
// Health reporting
// ============================================================================
//
// A service is only as healthy as its path to the sidecar, which we read
// off the sidecar circuit breaker.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason),
        }
    }
}

impl From<CircuitState> for HealthStatus {
    fn from(state: CircuitState) -> Self {
        match state {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("Sidecar circuit breaker half-open".to_string()),
            CircuitState::Open => HealthStatus::Unhealthy("Sidecar circuit breaker open".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub sidecar_circuit: &'static str,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(service: &'static str, circuit: CircuitState) -> Self {
        let status = HealthStatus::from(circuit);
        Self {
            service,
            status: status.as_str(),
            reason: status.reason().map(str::to_string),
            sidecar_circuit: circuit.as_str(),
            checked_at: Utc::now(),
        }
    }
}

/// GET /health. 503 only when the sidecar circuit is open.
pub async fn health_handler(state: web::Data<AppState>) -> impl Responder {
    let circuit = state.gateway.sidecar_state().await;
    let report = HealthReport::new(state.service.app_id(), circuit);

    if HealthStatus::from(circuit).is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(report)
    } else {
        HttpResponse::Ok().json(report)
    }
}
