// ============================================================================
// HTTP Services
// ============================================================================
//
// One binary, three apps. Every app serves /health and /metrics; the rest
// of the routes depend on which app this process is:
//
//   store    - /orders, /orders/{id}, /events, /dapr/subscribe, frontend
//   kitchen  - /cook
//   delivery - /deliver
//
// ============================================================================

pub mod delivery;
pub mod error;
pub mod health;
pub mod kitchen;
pub mod store;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use crate::config::{Config, ServiceKind, Timing};
use crate::messaging::{DaprClient, OrderGateway};
use crate::metrics::{metrics_handler, Metrics};

pub use error::ApiError;

/// Shared by every request handler of one app
pub struct AppState {
    pub service: ServiceKind,
    pub gateway: OrderGateway,
    pub metrics: Arc<Metrics>,
    pub timing: Timing,
}

/// Body extractor settings. A body that is not valid JSON is a 400 with the
/// usual error payload; the content type is not enforced.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| ApiError::MalformedBody(err.to_string()).into())
}

/// Register state and routes for the app named in `state.service`.
pub fn mount(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let kind = state.service;

    cfg.app_data(web::Data::from(state.metrics.clone()))
        .app_data(state)
        .app_data(json_config())
        .route("/health", web::get().to(health::health_handler))
        .route("/metrics", web::get().to(metrics_handler));

    match kind {
        ServiceKind::Store => store::configure(cfg),
        ServiceKind::Kitchen => kitchen::configure(cfg),
        ServiceKind::Delivery => delivery::configure(cfg),
    }
}

/// Build the sidecar client and serve the configured app until shutdown.
pub async fn run(config: Config, metrics: Arc<Metrics>) -> anyhow::Result<()> {
    let sidecar = Arc::new(DaprClient::new(&config.sidecar, metrics.clone())?);
    let gateway = OrderGateway::new(sidecar, config.sidecar.clone(), metrics.clone());

    let state = web::Data::new(AppState {
        service: config.service,
        gateway,
        metrics,
        timing: config.timing,
    });

    tracing::info!(
        app_id = config.service.app_id(),
        address = %format!("{}:{}", config.host, config.port),
        sidecar = %config.sidecar.http_endpoint,
        "🍕 Starting service"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .configure(|cfg| mount(cfg, state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!(app_id = config.service.app_id(), "Service stopped");
    Ok(())
}
