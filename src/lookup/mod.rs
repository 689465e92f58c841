// ============================================================================
// Collaborator Lookups
// ============================================================================
//
// Narrow read-only interfaces to the services that own products, users and
// coupons. Lookups never mutate cart state; the cart service may retry them
// on transient failure.
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{DiscountPercent, Money};
use crate::utils::IsTransient;

pub use memory::{InMemoryCatalog, InMemoryCoupons, InMemoryUsers};
pub use postgres::{PgCatalog, PgCouponLookup, PgUserDirectory};

/// Catalog entry as seen by the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub name: String,
    pub discount: DiscountPercent,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// A coupon is expired once its expiration instant lies before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("{service} returned invalid data: {reason}")]
    Invalid { service: &'static str, reason: String },
}

impl IsTransient for LookupError {
    fn is_transient(&self) -> bool {
        matches!(self, LookupError::Unavailable { .. })
    }
}

/// Resolve product id -> price.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, LookupError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, LookupError>;
}

/// Resolve coupon code -> discount percentage and expiry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CouponLookup: Send + Sync {
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(expires_at: Option<DateTime<Utc>>) -> Coupon {
        Coupon {
            code: "SPRING".to_string(),
            name: "Spring sale".to_string(),
            discount: DiscountPercent::new(10).unwrap(),
            expires_at,
        }
    }

    #[test]
    fn test_coupon_without_expiry_never_expires() {
        assert!(!coupon(None).is_expired_at(Utc::now()));
    }

    #[test]
    fn test_coupon_expiry_compares_with_now() {
        let now = Utc::now();
        assert!(coupon(Some(now - Duration::seconds(1))).is_expired_at(now));
        assert!(!coupon(Some(now + Duration::hours(1))).is_expired_at(now));
        assert!(!coupon(Some(now)).is_expired_at(now));
    }

    #[test]
    fn test_only_unavailable_is_transient() {
        let unavailable = LookupError::Unavailable {
            service: "catalog",
            reason: "timeout".to_string(),
        };
        let invalid = LookupError::Invalid {
            service: "catalog",
            reason: "negative price".to_string(),
        };

        assert!(unavailable.is_transient());
        assert!(!invalid.is_transient());
    }
}
