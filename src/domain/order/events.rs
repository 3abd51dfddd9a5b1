use std::fmt;

// ============================================================================
// Order Stages - The event labels emitted along the pipeline
// ============================================================================
//
// On the wire the stage is a free-text `event` string. Services only ever
// emit these eight labels, and branching compares them by exact match, so
// a label that is not listed here simply matches nothing.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStage {
    SentToKitchen,
    Cooking,
    ReadyForDelivery,
    DeliveryStarted,
    PickedUpByDriver,
    EnRoute,
    Nearby,
    Delivered,
}

impl OrderStage {
    /// Every stage in pipeline order.
    pub const ALL: [OrderStage; 8] = [
        OrderStage::SentToKitchen,
        OrderStage::Cooking,
        OrderStage::ReadyForDelivery,
        OrderStage::DeliveryStarted,
        OrderStage::PickedUpByDriver,
        OrderStage::EnRoute,
        OrderStage::Nearby,
        OrderStage::Delivered,
    ];

    /// The label carried in the order's `event` field
    pub fn label(self) -> &'static str {
        match self {
            OrderStage::SentToKitchen => "Sent to kitchen",
            OrderStage::Cooking => "Cooking",
            OrderStage::ReadyForDelivery => "Ready for delivery",
            OrderStage::DeliveryStarted => "Delivery started",
            OrderStage::PickedUpByDriver => "Order picked up by driver",
            OrderStage::EnRoute => "En-route",
            OrderStage::Nearby => "Nearby",
            OrderStage::Delivered => "Delivered",
        }
    }

    /// Exact, case-sensitive lookup. Typos yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.label() == label)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStage::Delivered)
    }
}

impl fmt::Display for OrderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
