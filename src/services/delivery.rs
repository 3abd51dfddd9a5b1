use actix_web::{web, HttpResponse};
use serde_json::Value;
use std::time::Duration;

use super::{ApiError, AppState};
use crate::config::Timing;
use crate::domain::order::{Order, OrderStage};
use crate::messaging::OrderGateway;

// ============================================================================
// Delivery - drives an order to the door in five timed steps
// ============================================================================

/// Wait, then relabel and publish, for each step in turn
pub const ROUTE: [(Duration, OrderStage); 5] = [
    (Duration::from_secs(3), OrderStage::DeliveryStarted),
    (Duration::from_secs(3), OrderStage::PickedUpByDriver),
    (Duration::from_secs(5), OrderStage::EnRoute),
    (Duration::from_secs(5), OrderStage::Nearby),
    (Duration::from_secs(5), OrderStage::Delivered),
];

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/deliver", web::post().to(start_delivery));
}

/// POST /deliver
async fn start_delivery(state: web::Data<AppState>, body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let order = Order::from_payload(body.into_inner())?;
    tracing::info!(order_id = %order.id_or_unknown(), "Delivery started");

    let order = deliver(&state.gateway, state.timing, order).await;

    tracing::info!(order_id = %order.id_or_unknown(), "Delivery completed");
    Ok(HttpResponse::Ok().json(order))
}

pub async fn deliver(gateway: &OrderGateway, timing: Timing, mut order: Order) -> Order {
    for (delay, stage) in ROUTE {
        tokio::time::sleep(timing.scaled(delay)).await;
        order.set_stage(stage);
        gateway.publish_or_log(&order).await;
    }
    order
}
