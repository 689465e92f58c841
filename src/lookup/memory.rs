use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::Money;
use super::{Catalog, Coupon, CouponLookup, LookupError, Product, UserDirectory};

// ============================================================================
// In-memory collaborators for tests and the local demo
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, id: Uuid, price: Money) -> Self {
        self.products.get_mut().insert(id, Product { id, price });
        self
    }

    /// Add or reprice a product. Lines already in carts keep their snapshot.
    pub async fn upsert(&self, id: Uuid, price: Money) {
        self.products.write().await.insert(id, Product { id, price });
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, LookupError> {
        Ok(self.products.read().await.get(&product_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: RwLock<HashSet<Uuid>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: Uuid) -> Self {
        self.users.get_mut().insert(id);
        self
    }

    pub async fn register(&self, id: Uuid) {
        self.users.write().await.insert(id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, LookupError> {
        Ok(self.users.read().await.contains(&user_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCoupons {
    coupons: RwLock<HashMap<String, Coupon>>,
}

impl InMemoryCoupons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coupon(mut self, coupon: Coupon) -> Self {
        self.coupons.get_mut().insert(coupon.code.clone(), coupon);
        self
    }

    pub async fn upsert(&self, coupon: Coupon) {
        self.coupons.write().await.insert(coupon.code.clone(), coupon);
    }
}

#[async_trait]
impl CouponLookup for InMemoryCoupons {
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>, LookupError> {
        Ok(self.coupons.read().await.get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::DiscountPercent;

    #[tokio::test]
    async fn test_catalog_upsert_reprices() {
        let id = Uuid::new_v4();
        let catalog = InMemoryCatalog::new().with_product(id, Money::from_minor(10));

        catalog.upsert(id, Money::from_minor(12)).await;

        let product = catalog.get_product(id).await.unwrap().unwrap();
        assert_eq!(product.price, Money::from_minor(12));
        assert!(catalog.get_product(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_users_membership() {
        let known = Uuid::new_v4();
        let users = InMemoryUsers::new().with_user(known);

        assert!(users.user_exists(known).await.unwrap());
        assert!(!users.user_exists(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_coupons_by_code() {
        let coupons = InMemoryCoupons::new().with_coupon(Coupon {
            code: "WELCOME".to_string(),
            name: "Welcome".to_string(),
            discount: DiscountPercent::new(5).unwrap(),
            expires_at: None,
        });

        assert!(coupons.get_coupon("WELCOME").await.unwrap().is_some());
        assert!(coupons.get_coupon("welcome").await.unwrap().is_none());
    }
}
