use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::OrderError;
use crate::lookup::LookupError;
use crate::persistence::PersistenceError;

// ============================================================================
// Cart Service Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("No open cart for user {0}")]
    CartNotFound(Uuid),

    #[error("No cart line for product {0}")]
    LineNotFound(Uuid),

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("No order with tracking id {0}")]
    OrderNotFound(Uuid),

    #[error("Product {0} is already in the cart")]
    DuplicateLine(Uuid),

    #[error("Coupon {code} expired at {expired_at}")]
    CouponExpired { code: String, expired_at: DateTime<Utc> },

    #[error("Invalid order state: {0}")]
    InvalidState(OrderError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Caller-facing classification of a `CartError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Expired,
    InvalidState,
    Unavailable,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Expired => "expired",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Persistence => "persistence",
        }
    }
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::UserNotFound(_)
            | CartError::ProductNotFound(_)
            | CartError::CartNotFound(_)
            | CartError::LineNotFound(_)
            | CartError::CouponNotFound(_)
            | CartError::OrderNotFound(_) => ErrorKind::NotFound,
            CartError::DuplicateLine(_) => ErrorKind::Conflict,
            CartError::CouponExpired { .. } => ErrorKind::Expired,
            CartError::InvalidState(_) => ErrorKind::InvalidState,
            CartError::Lookup(_) => ErrorKind::Unavailable,
            CartError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<OrderError> for CartError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::DuplicateLine(product_id) => CartError::DuplicateLine(product_id),
            OrderError::LineNotFound(product_id) => CartError::LineNotFound(product_id),
            other => CartError::InvalidState(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn test_order_errors_map_to_kinds() {
        let product_id = Uuid::new_v4();

        assert_eq!(CartError::from(OrderError::DuplicateLine(product_id)).kind(), ErrorKind::Conflict);
        assert_eq!(CartError::from(OrderError::LineNotFound(product_id)).kind(), ErrorKind::NotFound);
        assert_eq!(CartError::from(OrderError::EmptyCart).kind(), ErrorKind::InvalidState);
        assert_eq!(
            CartError::from(OrderError::NotPending(OrderStatus::Placed)).kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_version_conflict_is_a_persistence_error() {
        let err = CartError::from(PersistenceError::VersionConflict {
            order_id: Uuid::new_v4(),
            expected: 3,
        });
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.kind().as_str(), "persistence");
    }
}
