use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use super::sidecar::{InvokeResponse, Sidecar, SidecarError};
use crate::config::SidecarSettings;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

// ============================================================================
// Dapr HTTP client
// ============================================================================
//
// Talks to the local sidecar over its HTTP API (v1.0):
//   POST   /v1.0/publish/{pubsub}/{topic}
//   POST   /v1.0/state/{store}            [{"key": .., "value": ..}]
//   GET    /v1.0/state/{store}/{key}      204 when the key is absent
//   DELETE /v1.0/state/{store}/{key}
//   POST   /v1.0/invoke/{app_id}/method/{method}
//
// Path segments are percent-encoded, so a key holding `/`, `?` or `#`
// stays a single key.
//
// ============================================================================

const API_TOKEN_HEADER: &str = "dapr-api-token";

pub struct DaprClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl DaprClient {
    pub fn new(settings: &SidecarSettings, metrics: Arc<Metrics>) -> Result<Self, SidecarError> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;

        let invalid = |reason: String| SidecarError::InvalidEndpoint {
            endpoint: settings.http_endpoint.clone(),
            reason,
        };
        let base_url = Url::parse(&settings.http_endpoint).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        Ok(Self {
            http,
            base_url,
            api_token: settings.api_token.clone(),
            circuit_breaker: CircuitBreaker::new("dapr-sidecar", CircuitBreakerConfig::default()),
            metrics,
        })
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = CircuitBreaker::new("dapr-sidecar", config);
        self
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.header(API_TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Send through the circuit breaker. With `require_success` a non-2xx
    /// reply counts as a failure; otherwise only transport errors do.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        require_success: bool,
    ) -> Result<reqwest::Response, SidecarError> {
        let started = Instant::now();

        let result = self
            .circuit_breaker
            .call(async {
                let response = request.send().await?;
                let status = response.status();
                if require_success && !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(SidecarError::Status {
                        operation,
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok::<_, SidecarError>(response)
            })
            .await;

        self.metrics
            .record_sidecar_call(operation, result.is_ok(), started.elapsed().as_secs_f64());
        self.metrics
            .update_circuit_breaker_state(self.circuit_breaker.get_state().await);

        match result {
            Ok(response) => Ok(response),
            Err(CircuitBreakerError::CircuitOpen(circuit)) => {
                tracing::error!(circuit, operation, "Circuit breaker open - sidecar unavailable");
                Err(SidecarError::CircuitOpen)
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, operation, "Sidecar call failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Sidecar for DaprClient {
    async fn publish_event(&self, pubsub: &str, topic: &str, data: &Value) -> Result<(), SidecarError> {
        let request = self
            .request(Method::POST, &["v1.0", "publish", pubsub, topic])
            .json(data);

        self.execute("publish", request, true).await?;

        tracing::debug!(pubsub, topic, "Published to sidecar");
        Ok(())
    }

    async fn save_state(&self, store: &str, key: &str, value: &Value) -> Result<(), SidecarError> {
        let request = self
            .request(Method::POST, &["v1.0", "state", store])
            .json(&json!([{ "key": key, "value": value }]));

        self.execute("save_state", request, true).await?;
        Ok(())
    }

    async fn get_state(&self, store: &str, key: &str) -> Result<Option<Value>, SidecarError> {
        let request = self.request(Method::GET, &["v1.0", "state", store, key]);
        let response = self.execute("get_state", request, true).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_slice(&body)?;
        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn delete_state(&self, store: &str, key: &str) -> Result<(), SidecarError> {
        let request = self.request(Method::DELETE, &["v1.0", "state", store, key]);
        self.execute("delete_state", request, true).await?;
        Ok(())
    }

    async fn invoke_method(
        &self,
        app_id: &str,
        method: &str,
        data: &Value,
    ) -> Result<InvokeResponse, SidecarError> {
        let request = self
            .request(Method::POST, &["v1.0", "invoke", app_id, "method", method])
            .json(data);

        let response = self.execute("invoke", request, false).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(InvokeResponse { status, body })
    }

    async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.get_state().await
    }
}
