use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::order::{CartLine, OrderStatus};
use super::{
    CartLineRepository, Database, OrderRecord, OrderRepository, PersistenceError, Transaction,
};

// ============================================================================
// In-memory store
// ============================================================================
//
// Transactions stage their writes locally and publish them under the table
// lock on commit, after re-checking every version they relied on. Reads see
// committed rows overlaid with the transaction's own staged writes.
//
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<Uuid, OrderRecord>,
    lines: HashMap<Uuid, CartLine>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, PersistenceError> {
        Ok(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            orders: HashMap::new(),
            lines: HashMap::new(),
            expected_versions: HashMap::new(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    orders: HashMap<Uuid, OrderRecord>,
    // None marks a staged delete
    lines: HashMap<Uuid, Option<CartLine>>,
    // None: row must not exist yet; Some(v): row must still be at version v
    expected_versions: HashMap<Uuid, Option<i64>>,
}

impl InMemoryTransaction {
    async fn visible_orders(&self) -> Vec<OrderRecord> {
        let tables = self.tables.lock().await;
        tables
            .orders
            .values()
            .filter(|order| !self.orders.contains_key(&order.id))
            .chain(self.orders.values())
            .cloned()
            .collect()
    }

    async fn visible_lines(&self) -> Vec<CartLine> {
        let tables = self.tables.lock().await;
        let mut lines: Vec<CartLine> = tables
            .lines
            .values()
            .filter(|line| !self.lines.contains_key(&line.id))
            .cloned()
            .chain(self.lines.values().flatten().cloned())
            .collect();
        lines.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
        lines
    }

    async fn visible_line(&self, line_id: Uuid) -> Option<CartLine> {
        if let Some(staged) = self.lines.get(&line_id) {
            return staged.clone();
        }
        self.tables.lock().await.lines.get(&line_id).cloned()
    }

    fn newest_first(mut orders: Vec<OrderRecord>) -> Vec<OrderRecord> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }

    fn other_pending_for_user<'a>(
        mut orders: impl Iterator<Item = &'a OrderRecord>,
        order: &OrderRecord,
    ) -> bool {
        order.status.is_pending()
            && orders.any(|o| o.id != order.id && o.user_id == order.user_id && o.status.is_pending())
    }
}

#[async_trait]
impl OrderRepository for InMemoryTransaction {
    async fn find_pending_by_user(&mut self, user_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError> {
        Ok(self
            .visible_orders()
            .await
            .into_iter()
            .find(|order| order.user_id == user_id && order.status.is_pending()))
    }

    async fn find_by_tracking_id(&mut self, tracking_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError> {
        Ok(self
            .visible_orders()
            .await
            .into_iter()
            .find(|order| order.tracking_id == Some(tracking_id)))
    }

    async fn find_by_user_and_statuses(
        &mut self,
        user_id: Uuid,
        statuses: &[OrderStatus],
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        let orders = self
            .visible_orders()
            .await
            .into_iter()
            .filter(|order| order.user_id == user_id && statuses.contains(&order.status))
            .collect();
        Ok(Self::newest_first(orders))
    }

    async fn find_by_statuses(&mut self, statuses: &[OrderStatus]) -> Result<Vec<OrderRecord>, PersistenceError> {
        let orders = self
            .visible_orders()
            .await
            .into_iter()
            .filter(|order| statuses.contains(&order.status))
            .collect();
        Ok(Self::newest_first(orders))
    }

    async fn find_placed_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        let mut orders: Vec<OrderRecord> = self
            .visible_orders()
            .await
            .into_iter()
            .filter(|order| order.status == OrderStatus::Placed)
            .filter(|order| order.placed_at.is_some_and(|at| from <= at && at < to))
            .collect();
        orders.sort_by_key(|order| order.placed_at);
        Ok(orders)
    }

    async fn count_by_status(&mut self, status: OrderStatus) -> Result<u64, PersistenceError> {
        let count = self
            .visible_orders()
            .await
            .iter()
            .filter(|order| order.status == status)
            .count();
        Ok(count as u64)
    }

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<(), PersistenceError> {
        let visible = self.visible_orders().await;

        if visible.iter().any(|o| o.id == order.id) {
            return Err(PersistenceError::Duplicate(format!("order {}", order.id)));
        }
        if Self::other_pending_for_user(visible.iter(), order) {
            return Err(PersistenceError::Duplicate(format!(
                "pending order for user {}",
                order.user_id
            )));
        }

        self.expected_versions.entry(order.id).or_insert(None);
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &OrderRecord, expected_version: i64) -> Result<(), PersistenceError> {
        let current = self
            .visible_orders()
            .await
            .into_iter()
            .find(|o| o.id == order.id);

        match current {
            Some(current) if current.version == expected_version => {}
            _ => {
                return Err(PersistenceError::VersionConflict {
                    order_id: order.id,
                    expected: expected_version,
                })
            }
        }

        self.expected_versions
            .entry(order.id)
            .or_insert(Some(expected_version));
        self.orders.insert(order.id, order.clone());
        Ok(())
    }
}

#[async_trait]
impl CartLineRepository for InMemoryTransaction {
    async fn find_lines_by_order(&mut self, order_id: Uuid) -> Result<Vec<CartLine>, PersistenceError> {
        Ok(self
            .visible_lines()
            .await
            .into_iter()
            .filter(|line| line.order_id == order_id)
            .collect())
    }

    async fn find_line_by_order_and_product(
        &mut self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, PersistenceError> {
        Ok(self
            .visible_lines()
            .await
            .into_iter()
            .find(|line| line.order_id == order_id && line.product_id == product_id))
    }

    async fn insert_line(&mut self, line: &CartLine) -> Result<(), PersistenceError> {
        if self
            .find_line_by_order_and_product(line.order_id, line.product_id)
            .await?
            .is_some()
        {
            return Err(PersistenceError::Duplicate(format!(
                "line for product {} on order {}",
                line.product_id, line.order_id
            )));
        }

        self.lines.insert(line.id, Some(line.clone()));
        Ok(())
    }

    async fn update_line_quantity(&mut self, line_id: Uuid, quantity: u32) -> Result<(), PersistenceError> {
        let mut line = self
            .visible_line(line_id)
            .await
            .ok_or_else(|| PersistenceError::MissingRow(format!("cart line {line_id}")))?;

        line.quantity = quantity;
        self.lines.insert(line_id, Some(line));
        Ok(())
    }

    async fn delete_line(&mut self, line_id: Uuid) -> Result<(), PersistenceError> {
        if self.visible_line(line_id).await.is_none() {
            return Err(PersistenceError::MissingRow(format!("cart line {line_id}")));
        }

        self.lines.insert(line_id, None);
        Ok(())
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock().await;

        for (order_id, expected) in &self.expected_versions {
            let stored = tables.orders.get(order_id).map(|order| order.version);
            if stored != *expected {
                return Err(PersistenceError::VersionConflict {
                    order_id: *order_id,
                    expected: expected.unwrap_or(0),
                });
            }
        }

        for order in self.orders.values() {
            if Self::other_pending_for_user(tables.orders.values(), order) {
                return Err(PersistenceError::Duplicate(format!(
                    "pending order for user {}",
                    order.user_id
                )));
            }
        }

        tables.orders.extend(self.orders);
        for (line_id, line) in self.lines {
            match line {
                Some(line) => {
                    tables.lines.insert(line_id, line);
                }
                None => {
                    tables.lines.remove(&line_id);
                }
            }
        }

        Ok(())
    }

    async fn rollback(self) -> Result<(), PersistenceError> {
        // Staged writes are dropped with the transaction
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
