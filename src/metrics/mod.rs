// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use crate::domain::order::OrderStage;
use crate::utils::CircuitState;

// Re-export for public API
pub use server::metrics_handler;

// ============================================================================
// Metrics Module - Prometheus metrics for the relay services
// ============================================================================
//
// Each process owns one registry, scraped via GET /metrics:
// - Orders accepted by the store
// - Order events received and stages published, by label
// - Sidecar calls (count, outcome, latency) by operation
// - Sidecar circuit breaker state
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Order flow
    pub orders_created: IntCounter,
    pub order_events_received: IntCounterVec,
    pub stages_published: IntCounterVec,

    // Sidecar
    pub sidecar_requests: IntCounterVec,
    pub sidecar_request_duration: HistogramVec,
    pub circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders accepted by the store")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_events_received = IntCounterVec::new(
            Opts::new("order_events_received_total", "Order events delivered by the sidecar"),
            &["event"],
        )?;
        registry.register(Box::new(order_events_received.clone()))?;

        let stages_published = IntCounterVec::new(
            Opts::new("order_stages_published_total", "Order stage updates published"),
            &["event"],
        )?;
        registry.register(Box::new(stages_published.clone()))?;

        let sidecar_requests = IntCounterVec::new(
            Opts::new("sidecar_requests_total", "Calls made to the sidecar HTTP API"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(sidecar_requests.clone()))?;

        let sidecar_request_duration = HistogramVec::new(
            HistogramOpts::new("sidecar_request_duration_seconds", "Sidecar call latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
            &["operation"],
        )?;
        registry.register(Box::new(sidecar_request_duration.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Sidecar circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_events_received,
            stages_published,
            sidecar_requests,
            sidecar_request_duration,
            circuit_breaker_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    /// Unknown labels are folded into one series to keep cardinality bounded.
    pub fn record_event_received(&self, label: &str) {
        let label = OrderStage::from_label(label).map_or("unknown", OrderStage::label);
        self.order_events_received.with_label_values(&[label]).inc();
    }

    pub fn record_stage_published(&self, stage: OrderStage) {
        self.stages_published.with_label_values(&[stage.label()]).inc();
    }

    pub fn record_sidecar_call(&self, operation: &str, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "failure" };
        self.sidecar_requests.with_label_values(&[operation, outcome]).inc();
        self.sidecar_request_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn update_circuit_breaker_state(&self, state: CircuitState) {
        self.circuit_breaker_state.set(state.as_gauge());
    }
}
