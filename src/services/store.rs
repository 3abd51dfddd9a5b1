use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{ApiError, AppState};
use crate::config::Timing;
use crate::domain::order::{Order, OrderStage};
use crate::frontend;
use crate::messaging::{CloudEvent, DeliveryAck, DeliveryStatus, OrderGateway};

// ============================================================================
// Store - takes orders, tracks them, and hands them along
// ============================================================================
//
// The store is the only app that keeps state. Every order event on the
// topic comes back here, is saved under the order id, and its label decides
// the next hop:
//
//   "Sent to kitchen"    -> invoke kitchen /cook
//   "Ready for delivery" -> invoke delivery /deliver
//   anything else        -> saved only
//
// ============================================================================

/// Pause before an incoming order is passed to the kitchen
pub const KITCHEN_HANDOFF_DELAY: Duration = Duration::from_secs(4);

/// Route the sidecar delivers order events to
pub const EVENTS_ROUTE: &str = "/events";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::post().to(create_order))
        .route("/orders/{order_id}", web::get().to(get_order))
        .route("/orders/{order_id}", web::delete().to(delete_order))
        .route(EVENTS_ROUTE, web::post().to(order_events))
        .route("/dapr/subscribe", web::get().to(subscriptions))
        .route("/", web::get().to(frontend::index))
        .route("/app.js", web::get().to(frontend::script));
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderResponse {
    pub order_id: String,
}

/// Where an order event was sent after being saved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Handoff {
    Kitchen,
    Delivery,
    None,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /orders
async fn create_order(state: web::Data<AppState>, body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let mut order = Order::from_payload(body.into_inner())?;
    let order_id = order.assign_new_id().to_string();
    order.set_stage(OrderStage::SentToKitchen);

    tracing::info!(
        order_id = %order_id,
        address = order.address.as_deref().unwrap_or_default(),
        "Posting order"
    );

    state.gateway.publish(&order).await?;
    state.metrics.record_order_created();

    Ok(HttpResponse::Ok().json(CreateOrderResponse { order_id, order }))
}

/// GET /orders/{order_id}
async fn get_order(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();

    match state.gateway.load(&order_id).await? {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ApiError::NotFound(order_id)),
    }
}

/// DELETE /orders/{order_id}
async fn delete_order(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    state.gateway.remove(&order_id).await?;

    Ok(HttpResponse::Ok().json(DeleteOrderResponse { order_id }))
}

/// POST /events - order updates delivered by the sidecar
async fn order_events(state: web::Data<AppState>, envelope: web::Json<CloudEvent>) -> Result<HttpResponse, ApiError> {
    let CloudEvent {
        id,
        topic,
        pubsubname,
        data,
    } = envelope.into_inner();
    let order = Order::from_event_data(data)?;

    tracing::debug!(
        cloud_event_id = ?id,
        pubsub = ?pubsubname,
        topic = ?topic,
        event = %order.event_label(),
        "Order event received"
    );

    state.metrics.record_event_received(order.event_label());

    if order.order_id.is_none() {
        tracing::warn!(
            cloud_event_id = ?id,
            topic = ?topic,
            event = %order.event_label(),
            "Dropping order event without order_id"
        );
        return Ok(HttpResponse::Ok().json(DeliveryAck {
            status: DeliveryStatus::Drop,
        }));
    }

    handle_order_event(&state.gateway, state.timing, order).await;

    Ok(HttpResponse::Ok().json(DeliveryAck {
        status: DeliveryStatus::Success,
    }))
}

/// GET /dapr/subscribe
async fn subscriptions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(vec![state.gateway.subscription(EVENTS_ROUTE)])
}

// ============================================================================
// Relay
// ============================================================================

/// Save the order and pass it to the next app. Sidecar failures are logged
/// and otherwise ignored.
pub async fn handle_order_event(gateway: &OrderGateway, timing: Timing, order: Order) -> Handoff {
    let Ok(order_id) = order.id() else {
        return Handoff::None;
    };

    tracing::info!(order_id, event = %order.event_label(), "Processing order event");

    if let Err(e) = gateway.save(order_id, &order).await {
        tracing::error!(order_id, error = %e, "Failed to save order");
    }

    match order.stage() {
        Some(OrderStage::SentToKitchen) => {
            tokio::time::sleep(timing.scaled(KITCHEN_HANDOFF_DELAY)).await;
            if let Err(e) = gateway.send_to_kitchen(&order).await {
                tracing::error!(order_id, error = %e, "Failed to send order to kitchen");
            }
            Handoff::Kitchen
        }
        Some(OrderStage::ReadyForDelivery) => {
            if let Err(e) = gateway.send_to_delivery(&order).await {
                tracing::error!(order_id, error = %e, "Failed to send order to delivery");
            }
            Handoff::Delivery
        }
        Some(stage) if stage.is_terminal() => {
            tracing::info!(order_id, "🎉 Order delivered");
            Handoff::None
        }
        _ => Handoff::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceKind, SidecarSettings};
    use crate::messaging::in_memory::InMemorySidecar;
    use crate::metrics::Metrics;
    use crate::services::{mount, test_support};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn new_order() -> Value {
        json!({
            "customer": { "name": "Ada", "email": "ada@example.com" },
            "items": [{ "type": "pepperoni", "amount": 1 }],
            "address": "1 Main St",
            "creditCard": "tok_visa",
            "drink": "cola"
        })
    }

    fn envelope(data: Value) -> Value {
        json!({
            "id": "evt-1",
            "source": "pizza-store",
            "type": "com.dapr.event.sent",
            "specversion": "1.0",
            "datacontenttype": "application/json",
            "topic": "order",
            "pubsubname": "pizzapubsub",
            "data": data
        })
    }

    fn gateway(sidecar: Arc<InMemorySidecar>) -> OrderGateway {
        OrderGateway::new(sidecar, SidecarSettings::default(), Arc::new(Metrics::new().unwrap()))
    }

    fn order_at(id: &str, label: &str) -> Order {
        Order {
            order_id: Some(id.to_string()),
            event: Some(label.to_string()),
            ..Order::default()
        }
    }

    // ------------------------------------------------------------------------
    // HTTP
    // ------------------------------------------------------------------------

    #[actix_web::test]
    async fn test_create_order_assigns_fresh_id_and_publishes() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let state = test_support::state(ServiceKind::Store, sidecar.clone());
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let mut ids = Vec::new();
        for _ in 0..2 {
            let body: Value = test::call_and_read_body_json(
                &app,
                test::TestRequest::post().uri("/orders").set_json(new_order()).to_request(),
            )
            .await;
            let order_id = body["orderId"].as_str().unwrap().to_string();
            assert!(uuid::Uuid::parse_str(&order_id).is_ok());
            assert_eq!(body["order"]["order_id"], json!(order_id));
            assert_eq!(body["order"]["event"], "Sent to kitchen");
            ids.push(order_id);
        }

        assert_ne!(ids[0], ids[1]);
        assert_eq!(sidecar.published_events(), vec!["Sent to kitchen", "Sent to kitchen"]);
        assert_eq!(state.metrics.orders_created.get(), 2);
    }

    #[actix_web::test]
    async fn test_create_order_replaces_client_supplied_id() {
        let state = test_support::state(ServiceKind::Store, Arc::new(InMemorySidecar::default()));
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let mut payload = new_order();
        payload["order_id"] = json!("chosen-by-client");
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/orders").set_json(payload).to_request(),
        )
        .await;

        assert_ne!(body["orderId"], "chosen-by-client");
    }

    #[actix_web::test]
    async fn test_create_order_rejects_null_and_malformed_bodies() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let state = test_support::state(ServiceKind::Store, sidecar.clone());
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let bodies: [&[u8]; 4] = [b"null", b"{not json", b"", b"[1,2,3]"];
        for body in bodies {
            let req = test::TestRequest::post()
                .uri("/orders")
                .insert_header(("content-type", "application/json"))
                .set_payload(body.to_vec())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {:?}", body);

            let json: Value = test::read_body_json(resp).await;
            assert_eq!(json["success"], false);
        }

        assert!(sidecar.published().is_empty());
    }

    #[actix_web::test]
    async fn test_create_order_reports_publish_failure() {
        let sidecar = Arc::new(InMemorySidecar::default());
        sidecar.set_failing(true);
        let state = test_support::state(ServiceKind::Store, sidecar);
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/orders").set_json(new_order()).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.metrics.orders_created.get(), 0);
    }

    #[actix_web::test]
    async fn test_get_order_returns_saved_state_or_404() {
        let sidecar = Arc::new(InMemorySidecar::default());
        sidecar.put_state("abc", json!({ "order_id": "abc", "event": "Nearby" }));
        let state = test_support::state(ServiceKind::Store, sidecar);
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let found: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/orders/abc").to_request()).await;
        assert_eq!(found["event"], "Nearby");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/orders/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_get_order_reports_sidecar_failure_as_bad_gateway() {
        let sidecar = Arc::new(InMemorySidecar::default());
        sidecar.put_state("abc", json!({ "order_id": "abc", "event": "Nearby" }));
        sidecar.set_failing(true);
        let state = test_support::state(ServiceKind::Store, sidecar);
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/orders/abc").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_delete_order_removes_state() {
        let sidecar = Arc::new(InMemorySidecar::default());
        sidecar.put_state("abc", json!({ "order_id": "abc" }));
        let state = test_support::state(ServiceKind::Store, sidecar.clone());
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::delete().uri("/orders/abc").to_request()).await;

        assert_eq!(body, json!({ "orderId": "abc" }));
        assert!(sidecar.stored("abc").is_none());
    }

    #[actix_web::test]
    async fn test_events_saves_and_sends_to_kitchen() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let state = test_support::state(ServiceKind::Store, sidecar.clone());
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let data = json!({ "order_id": "abc", "event": "Sent to kitchen" });
        let req = test::TestRequest::post()
            .uri("/events")
            .insert_header(("content-type", "application/cloudevents+json"))
            .set_payload(envelope(data).to_string())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({ "status": "SUCCESS" }));
        assert_eq!(sidecar.stored("abc").unwrap()["event"], "Sent to kitchen");

        let invocations = sidecar.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, "pizza-kitchen");
        assert_eq!(invocations[0].1, "cook");
        assert_eq!(invocations[0].2["order_id"], "abc");
        assert_eq!(invocations[0].2["event"], "Sent to kitchen");
    }

    #[actix_web::test]
    async fn test_events_rejects_missing_data() {
        let state = test_support::state(ServiceKind::Store, Arc::new(InMemorySidecar::default()));
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let req = test::TestRequest::post()
            .uri("/events")
            .set_json(json!({ "id": "evt-1", "topic": "order" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_events_drops_orders_without_id() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let state = test_support::state(ServiceKind::Store, sidecar.clone());
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let req = test::TestRequest::post()
            .uri("/events")
            .set_json(envelope(json!({ "event": "Cooking" })))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({ "status": "DROP" }));
        assert!(sidecar.invocations().is_empty());
    }

    #[actix_web::test]
    async fn test_events_acknowledges_even_when_sidecar_fails() {
        let sidecar = Arc::new(InMemorySidecar::default());
        sidecar.set_failing(true);
        let state = test_support::state(ServiceKind::Store, sidecar);
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let req = test::TestRequest::post()
            .uri("/events")
            .set_json(envelope(json!({ "order_id": "abc", "event": "Ready for delivery" })))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_subscribe_lists_order_topic() {
        let state = test_support::state(ServiceKind::Store, Arc::new(InMemorySidecar::default()));
        let app = test::init_service(App::new().configure(|cfg| mount(cfg, state.clone()))).await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/dapr/subscribe").to_request()).await;

        assert_eq!(
            body,
            json!([{ "pubsubname": "pizzapubsub", "topic": "order", "route": "/events" }])
        );
    }

    // ------------------------------------------------------------------------
    // Relay
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dispatch_by_exact_label() {
        let cases = [
            ("Sent to kitchen", Handoff::Kitchen),
            ("Ready for delivery", Handoff::Delivery),
            ("Cooking", Handoff::None),
            ("Delivered", Handoff::None),
            ("ready for delivery", Handoff::None),
            ("Sent to kitchen!", Handoff::None),
        ];

        for (label, expected) in cases {
            let sidecar = Arc::new(InMemorySidecar::default());
            let handoff = handle_order_event(&gateway(sidecar.clone()), Timing::INSTANT, order_at("a", label)).await;

            assert_eq!(handoff, expected, "label {:?}", label);
            assert_eq!(sidecar.stored("a").unwrap()["event"], label);
            let expected_calls = usize::from(expected != Handoff::None);
            assert_eq!(sidecar.invocations().len(), expected_calls);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_kitchen_handoff_waits_before_invoking() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let started = tokio::time::Instant::now();

        handle_order_event(&gateway(sidecar.clone()), Timing::REAL, order_at("a", "Sent to kitchen")).await;

        assert_eq!(started.elapsed(), KITCHEN_HANDOFF_DELAY);
        assert_eq!(sidecar.invocations().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_handoff_is_immediate() {
        let sidecar = Arc::new(InMemorySidecar::default());
        let started = tokio::time::Instant::now();

        handle_order_event(&gateway(sidecar), Timing::REAL, order_at("a", "Ready for delivery")).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
