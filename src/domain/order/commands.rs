use uuid::Uuid;

use super::value_objects::{AppliedCoupon, Money};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    AddLine {
        line_id: Uuid,
        product_id: Uuid,
        unit_price: Money,
    },
    IncreaseQuantity {
        product_id: Uuid,
    },
    DecreaseQuantity {
        product_id: Uuid,
    },
    ApplyCoupon {
        coupon: AppliedCoupon,
    },
    PlaceOrder {
        tracking_id: Uuid,
        address: Option<String>,
        description: Option<String>,
    },
    CancelOrder {
        reason: Option<String>,
    },
}
