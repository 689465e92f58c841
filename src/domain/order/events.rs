use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::core::DomainEvent;
use super::value_objects::{AppliedCoupon, CartLine};

// ============================================================================
// Order Events - Facts produced by the Order aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Opened(CartOpened),
    LineAdded(LineAdded),
    QuantityChanged(QuantityChanged),
    LineRemoved(LineRemoved),
    CouponApplied(CouponApplied),
    Placed(OrderPlaced),
    Cancelled(OrderCancelled),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Opened(_) => "CartOpened",
            OrderEvent::LineAdded(_) => "LineAdded",
            OrderEvent::QuantityChanged(_) => "QuantityChanged",
            OrderEvent::LineRemoved(_) => "LineRemoved",
            OrderEvent::CouponApplied(_) => "CouponApplied",
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Cart Opened - a new Pending order for a user
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CartOpened {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub opened_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LineAdded {
    pub line: CartLine,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuantityChanged {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Line Removed - quantity dropped below one
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LineRemoved {
    pub line_id: Uuid,
    pub product_id: Uuid,
}

/// Coupon Applied - replaces any previously attached coupon
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CouponApplied {
    pub coupon: AppliedCoupon,
}

/// Order Placed - cart closed for further mutation
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub tracking_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderCancelled {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}
