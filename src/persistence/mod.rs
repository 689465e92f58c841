// ============================================================================
// Persistence - Repositories and Scoped Transactions
// ============================================================================
//
// One repository interface per entity (orders, cart lines). All reads and
// writes of a cart operation go through a single `Transaction`; dropping a
// transaction without `commit` discards every write made through it.
//
// Coupons are read through `lookup::CouponLookup`.
//
// ============================================================================

mod memory;
mod postgres;
#[cfg(test)]
pub(crate) mod test_db;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::{AppliedCoupon, CartLine, Money, OrderAggregate, OrderStatus};

pub use memory::{InMemoryDatabase, InMemoryTransaction};
pub use postgres::{PgDatabase, PgTransaction};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Order {order_id} was modified concurrently (expected version {expected})")]
    VersionConflict { order_id: Uuid, expected: i64 },

    #[error("Unique constraint violated: {0}")]
    Duplicate(String),

    #[error("Row not found: {0}")]
    MissingRow(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Stored order row, without its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon: Option<AppliedCoupon>,
    pub tracking_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cancelled_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl OrderRecord {
    pub fn from_aggregate(order: &OrderAggregate) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            subtotal: order.subtotal,
            discount: order.discount,
            total_amount: order.total_amount,
            coupon: order.coupon.clone(),
            tracking_id: order.tracking_id,
            placed_at: order.placed_at,
            address: order.address.clone(),
            description: order.description.clone(),
            cancelled_reason: order.cancelled_reason.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            version: order.version,
        }
    }

    /// Rebuild the aggregate. Totals are recomputed from the lines.
    pub fn into_aggregate(self, lines: Vec<CartLine>) -> Result<OrderAggregate, PersistenceError> {
        let mut order = OrderAggregate {
            id: self.id,
            version: self.version,
            user_id: self.user_id,
            status: self.status,
            lines,
            subtotal: self.subtotal,
            discount: self.discount,
            total_amount: self.total_amount,
            coupon: self.coupon,
            tracking_id: self.tracking_id,
            placed_at: self.placed_at,
            address: self.address,
            description: self.description,
            cancelled_reason: self.cancelled_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        order
            .recalculate_totals()
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        Ok(order)
    }
}

#[async_trait]
pub trait OrderRepository: Send {
    async fn find_pending_by_user(&mut self, user_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError>;

    async fn find_by_tracking_id(&mut self, tracking_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError>;

    /// Newest first.
    async fn find_by_user_and_statuses(
        &mut self,
        user_id: Uuid,
        statuses: &[OrderStatus],
    ) -> Result<Vec<OrderRecord>, PersistenceError>;

    /// Newest first.
    async fn find_by_statuses(&mut self, statuses: &[OrderStatus]) -> Result<Vec<OrderRecord>, PersistenceError>;

    /// Placed orders with `from <= placed_at < to`, oldest first.
    async fn find_placed_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>, PersistenceError>;

    async fn count_by_status(&mut self, status: OrderStatus) -> Result<u64, PersistenceError>;

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<(), PersistenceError>;

    /// Write `order` only if the stored row is still at `expected_version`.
    async fn update_order(&mut self, order: &OrderRecord, expected_version: i64) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait CartLineRepository: Send {
    /// Lines in the order they were added.
    async fn find_lines_by_order(&mut self, order_id: Uuid) -> Result<Vec<CartLine>, PersistenceError>;

    async fn find_line_by_order_and_product(
        &mut self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, PersistenceError>;

    async fn insert_line(&mut self, line: &CartLine) -> Result<(), PersistenceError>;

    async fn update_line_quantity(&mut self, line_id: Uuid, quantity: u32) -> Result<(), PersistenceError>;

    async fn delete_line(&mut self, line_id: Uuid) -> Result<(), PersistenceError>;
}

/// A unit of work over both repositories.
#[async_trait]
pub trait Transaction: OrderRepository + CartLineRepository + Send + Sized {
    async fn commit(self) -> Result<(), PersistenceError>;

    async fn rollback(self) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait Database: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, PersistenceError>;
}
