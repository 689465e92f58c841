use uuid::Uuid;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Product {0} is already in the cart")]
    DuplicateLine(Uuid),

    #[error("No cart line for product {0}")]
    LineNotFound(Uuid),

    #[error("Cannot modify order in status: {0}")]
    NotPending(OrderStatus),

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    #[error("Quantity limit reached for product {0}")]
    QuantityOverflow(Uuid),

    #[error("Order {0} total exceeds the representable amount")]
    AmountOverflow(Uuid),

    #[error("Discount percentage out of range: {0}")]
    InvalidDiscount(u8),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Aggregate not initialized")]
    NotInitialized,
}
