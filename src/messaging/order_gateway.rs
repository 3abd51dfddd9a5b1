use std::sync::Arc;

use super::sidecar::{InvokeResponse, Sidecar, SidecarError, Subscription};
use crate::config::SidecarSettings;
use crate::domain::order::Order;
use crate::metrics::Metrics;
use crate::utils::CircuitState;

// ============================================================================
// Order Gateway - Order-typed view of the sidecar
// ============================================================================
//
// Binds the sidecar calls to the component names every app shares
// (pub/sub, topic, state store, peer app ids) so handlers only deal with
// Orders.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderGateway {
    sidecar: Arc<dyn Sidecar>,
    settings: SidecarSettings,
    metrics: Arc<Metrics>,
}

impl OrderGateway {
    pub fn new(sidecar: Arc<dyn Sidecar>, settings: SidecarSettings, metrics: Arc<Metrics>) -> Self {
        Self {
            sidecar,
            settings,
            metrics,
        }
    }

    /// Publish the order, as it currently stands, to the order topic.
    pub async fn publish(&self, order: &Order) -> Result<(), SidecarError> {
        let data = serde_json::to_value(order)?;
        self.sidecar
            .publish_event(&self.settings.pubsub_name, &self.settings.topic, &data)
            .await?;

        if let Some(stage) = order.stage() {
            self.metrics.record_stage_published(stage);
        }

        tracing::info!(
            order_id = %order.id_or_unknown(),
            event = %order.event_label(),
            "Published order event"
        );
        Ok(())
    }

    /// Publish, logging instead of failing. Relay steps never stop on a
    /// failed publish.
    pub async fn publish_or_log(&self, order: &Order) -> bool {
        match self.publish(order).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    order_id = %order.id_or_unknown(),
                    event = %order.event_label(),
                    error = %e,
                    "Failed to publish order event"
                );
                false
            }
        }
    }

    pub async fn save(&self, order_id: &str, order: &Order) -> Result<(), SidecarError> {
        let value = serde_json::to_value(order)?;
        self.sidecar
            .save_state(&self.settings.state_store, order_id, &value)
            .await?;

        tracing::info!(order_id, event = %order.event_label(), "Saved order");
        Ok(())
    }

    pub async fn load(&self, order_id: &str) -> Result<Option<Order>, SidecarError> {
        let Some(value) = self.sidecar.get_state(&self.settings.state_store, order_id).await? else {
            return Ok(None);
        };

        let order = Order::from_event_data(value).map_err(|e| SidecarError::MalformedState {
            key: order_id.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(order_id, event = %order.event_label(), "Loaded order");
        Ok(Some(order))
    }

    pub async fn remove(&self, order_id: &str) -> Result<(), SidecarError> {
        self.sidecar
            .delete_state(&self.settings.state_store, order_id)
            .await?;

        tracing::info!(order_id, "Deleted order");
        Ok(())
    }

    pub async fn send_to_kitchen(&self, order: &Order) -> Result<InvokeResponse, SidecarError> {
        self.invoke(&self.settings.kitchen_app_id, "cook", order).await
    }

    pub async fn send_to_delivery(&self, order: &Order) -> Result<InvokeResponse, SidecarError> {
        self.invoke(&self.settings.delivery_app_id, "deliver", order).await
    }

    async fn invoke(&self, app_id: &str, method: &str, order: &Order) -> Result<InvokeResponse, SidecarError> {
        let data = serde_json::to_value(order)?;
        let response = self.sidecar.invoke_method(app_id, method, &data).await?;

        if response.is_success() {
            tracing::info!(
                order_id = %order.id_or_unknown(),
                app_id,
                method,
                status = response.status,
                "Invocation returned"
            );
        } else {
            tracing::warn!(
                order_id = %order.id_or_unknown(),
                app_id,
                method,
                status = response.status,
                body = %response.body,
                "Invocation returned an error status"
            );
        }
        Ok(response)
    }

    /// The subscription this app asks the sidecar for, delivered to `route`.
    pub fn subscription(&self, route: &str) -> Subscription {
        Subscription {
            pubsubname: self.settings.pubsub_name.clone(),
            topic: self.settings.topic.clone(),
            route: route.to_string(),
        }
    }

    pub async fn sidecar_state(&self) -> CircuitState {
        self.sidecar.circuit_state().await
    }
}
