use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{CartLine, Money, OrderAggregate, OrderError, OrderStatus};

// ============================================================================
// Read projections returned by the cart service
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl TryFrom<&CartLine> for CartLineView {
    type Error = OrderError;

    fn try_from(line: &CartLine) -> Result<Self, Self::Error> {
        Ok(Self {
            id: line.id,
            product_id: line.product_id,
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total()?,
        })
    }
}

/// An order or cart as seen by callers. `id` is `None` for a cart that
/// has not been opened yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon_code: Option<String>,
    pub coupon_name: Option<String>,
    pub tracking_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl OrderView {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            status: OrderStatus::Pending,
            lines: Vec::new(),
            subtotal: Money::ZERO,
            discount: Money::ZERO,
            total_amount: Money::ZERO,
            coupon_code: None,
            coupon_name: None,
            tracking_id: None,
            placed_at: None,
            address: None,
            description: None,
        }
    }
}

impl TryFrom<&OrderAggregate> for OrderView {
    type Error = OrderError;

    fn try_from(order: &OrderAggregate) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(order.id),
            user_id: order.user_id,
            status: order.status,
            lines: order
                .lines
                .iter()
                .map(CartLineView::try_from)
                .collect::<Result<_, _>>()?,
            subtotal: order.subtotal,
            discount: order.discount,
            total_amount: order.total_amount,
            coupon_code: order.coupon.as_ref().map(|c| c.code.clone()),
            coupon_name: order.coupon.as_ref().map(|c| c.name.clone()),
            tracking_id: order.tracking_id,
            placed_at: order.placed_at,
            address: order.address.clone(),
            description: order.description.clone(),
        })
    }
}
