use actix_web::{web, HttpResponse};
use rand::Rng;
use serde_json::Value;
use std::ops::RangeInclusive;
use std::time::Duration;

use super::{ApiError, AppState};
use crate::config::Timing;
use crate::domain::order::{Order, OrderStage};
use crate::messaging::OrderGateway;

// ============================================================================
// Kitchen - cooks an order for a random time
// ============================================================================

/// Preparation time bounds in whole seconds, both inclusive
pub const PREP_TIME_SECS: RangeInclusive<u64> = 4..=7;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/cook", web::post().to(start_cooking));
}

/// POST /cook
async fn start_cooking(state: web::Data<AppState>, body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let order = Order::from_payload(body.into_inner())?;
    tracing::info!(order_id = %order.id_or_unknown(), "Cooking order");

    let order = cook(&state.gateway, state.timing, order).await;

    tracing::info!(order_id = %order.id_or_unknown(), "Order is ready for delivery!");
    Ok(HttpResponse::Ok().json(order))
}

/// Publish `Cooking` with a prep time, wait it out, publish
/// `Ready for delivery`.
pub async fn cook(gateway: &OrderGateway, timing: Timing, mut order: Order) -> Order {
    let prep_time = rand::thread_rng().gen_range(PREP_TIME_SECS);

    order.prep_time = Some(prep_time);
    order.set_stage(OrderStage::Cooking);
    gateway.publish_or_log(&order).await;

    tokio::time::sleep(timing.scaled(Duration::from_secs(prep_time))).await;
    tracing::debug!(order_id = %order.id_or_unknown(), prep_time, "Cooking done");

    order.set_stage(OrderStage::ReadyForDelivery);
    gateway.publish_or_log(&order).await;

    order
}
