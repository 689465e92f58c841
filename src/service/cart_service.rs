use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::{
    AppliedCoupon, Money, OrderAggregate, OrderCommand, OrderEvent, OrderStatus,
};
use crate::domain::{Aggregate, DomainEvent};
use crate::lookup::{Catalog, CouponLookup, LookupError, UserDirectory};
use crate::metrics::CartMetrics;
use crate::persistence::{
    CartLineRepository, Database, OrderRecord, OrderRepository, Transaction,
};
use crate::utils::{retry_on_transient, RetryConfig};
use super::errors::CartError;
use super::locks::UserLocks;
use super::views::{CartLineView, OrderView};

// ============================================================================
// Cart Service - Aggregate Manager for Pending Orders
// ============================================================================
//
// Every mutation follows the same path:
//
// 1. Take the user's lock
// 2. Begin a transaction and load the user's Pending order (if any)
// 3. Resolve collaborators (retrying transient failures)
// 4. Run the command on the aggregate to get events
// 5. Write the events' effects and the order row (version checked)
// 6. Commit
//
// Any error before step 6 drops the transaction, so nothing is written.
//
// ============================================================================

pub struct CartService<D: Database> {
    db: D,
    catalog: Arc<dyn Catalog>,
    users: Arc<dyn UserDirectory>,
    coupons: Arc<dyn CouponLookup>,
    locks: UserLocks,
    retry: RetryConfig,
    metrics: Option<Arc<CartMetrics>>,
}

impl<D: Database> CartService<D> {
    pub fn new(
        db: D,
        catalog: Arc<dyn Catalog>,
        users: Arc<dyn UserDirectory>,
        coupons: Arc<dyn CouponLookup>,
    ) -> Self {
        Self {
            db,
            catalog,
            users,
            coupons,
            locks: UserLocks::new(),
            retry: RetryConfig::default(),
            metrics: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<CartMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // ========================================================================
    // Cart mutations
    // ========================================================================

    /// Add one unit of `product_id` to the user's cart, opening a cart if
    /// the user has none.
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLineView, CartError> {
        self.observed("add_item", async {
            let _guard = self.locks.acquire(user_id).await;
            let mut tx = self.db.begin().await?;

            let (mut order, mut events) = match Self::load_pending(&mut tx, user_id).await? {
                Some(order) => (order, Vec::new()),
                None => {
                    let (order, opened) = OrderAggregate::open(Uuid::now_v7(), user_id)?;
                    (order, vec![opened])
                }
            };

            if order.line_for(product_id).is_some() {
                return Err(CartError::DuplicateLine(product_id));
            }

            if !self.lookup("users", || self.users.user_exists(user_id)).await? {
                return Err(CartError::UserNotFound(user_id));
            }
            let product = self
                .lookup("catalog", || self.catalog.get_product(product_id))
                .await?
                .ok_or(CartError::ProductNotFound(product_id))?;
            if product.price < Money::ZERO {
                return Err(LookupError::Invalid {
                    service: "catalog",
                    reason: format!("product {product_id} has negative price {}", product.price),
                }
                .into());
            }

            let line_id = Uuid::now_v7();
            events.extend(order.execute(&OrderCommand::AddLine {
                line_id,
                product_id,
                unit_price: product.price,
            })?);

            Self::persist(&mut tx, &mut order, &events).await?;
            tx.commit().await?;

            tracing::info!(
                user_id = %user_id,
                order_id = %order.id,
                product_id = %product_id,
                unit_price = %product.price,
                total = %order.total_amount,
                "Item added to cart"
            );

            order
                .lines
                .iter()
                .find(|line| line.id == line_id)
                .ok_or(CartError::LineNotFound(product_id))
                .and_then(|line| Ok(CartLineView::try_from(line)?))
        })
        .await
    }

    /// Attach a coupon to the user's cart, replacing any previous one.
    pub async fn apply_coupon(&self, user_id: Uuid, code: &str) -> Result<OrderView, CartError> {
        self.observed("apply_coupon", async {
            let _guard = self.locks.acquire(user_id).await;
            let mut tx = self.db.begin().await?;

            let mut order = Self::load_pending(&mut tx, user_id)
                .await?
                .ok_or(CartError::CartNotFound(user_id))?;

            let coupon = self
                .lookup("coupons", || self.coupons.get_coupon(code))
                .await?
                .ok_or_else(|| CartError::CouponNotFound(code.to_string()))?;

            let now = Utc::now();
            if let Some(expired_at) = coupon.expires_at.filter(|_| coupon.is_expired_at(now)) {
                return Err(CartError::CouponExpired {
                    code: coupon.code,
                    expired_at,
                });
            }

            let events = order.execute(&OrderCommand::ApplyCoupon {
                coupon: AppliedCoupon {
                    code: coupon.code,
                    name: coupon.name,
                    discount: coupon.discount,
                },
            })?;

            Self::persist(&mut tx, &mut order, &events).await?;
            tx.commit().await?;

            tracing::info!(
                user_id = %user_id,
                order_id = %order.id,
                coupon = code,
                discount = %order.discount,
                total = %order.total_amount,
                "Coupon applied"
            );

            Ok(OrderView::try_from(&order)?)
        })
        .await
    }

    pub async fn increase_quantity(&self, user_id: Uuid, product_id: Uuid) -> Result<OrderView, CartError> {
        self.observed("increase_quantity", self.mutate_pending(user_id, OrderCommand::IncreaseQuantity { product_id }))
            .await
    }

    /// Remove one unit; the line disappears when its quantity would hit zero.
    pub async fn decrease_quantity(&self, user_id: Uuid, product_id: Uuid) -> Result<OrderView, CartError> {
        self.observed("decrease_quantity", self.mutate_pending(user_id, OrderCommand::DecreaseQuantity { product_id }))
            .await
    }

    /// Close the cart as a placed order. The next `add_item` opens a new cart.
    pub async fn place_order(
        &self,
        user_id: Uuid,
        address: Option<String>,
        description: Option<String>,
    ) -> Result<OrderView, CartError> {
        let view = self
            .observed(
                "place_order",
                self.mutate_pending(
                    user_id,
                    OrderCommand::PlaceOrder {
                        tracking_id: Uuid::new_v4(),
                        address,
                        description,
                    },
                ),
            )
            .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_order_placed();
        }
        Ok(view)
    }

    pub async fn cancel_cart(&self, user_id: Uuid, reason: Option<String>) -> Result<OrderView, CartError> {
        self.observed("cancel_cart", self.mutate_pending(user_id, OrderCommand::CancelOrder { reason }))
            .await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The user's cart, or an empty projection if none is open.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<OrderView, CartError> {
        self.observed("get_cart", async {
            let mut tx = self.db.begin().await?;
            let order = Self::load_pending(&mut tx, user_id).await?;
            tx.rollback().await?;

            tracing::debug!(user_id = %user_id, open = order.is_some(), "Cart read");
            match order {
                Some(order) => Ok(OrderView::try_from(&order)?),
                None => Ok(OrderView::empty(user_id)),
            }
        })
        .await
    }

    /// Placed and cancelled orders of one user, newest first.
    pub async fn list_placed_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, CartError> {
        self.observed("list_placed_orders", async {
            let mut tx = self.db.begin().await?;
            let records = tx
                .find_by_user_and_statuses(user_id, &[OrderStatus::Placed, OrderStatus::Cancelled])
                .await?;
            let views = Self::views(&mut tx, records).await?;
            tx.rollback().await?;
            Ok(views)
        })
        .await
    }

    pub async fn find_by_tracking_id(&self, tracking_id: Uuid) -> Result<OrderView, CartError> {
        self.observed("find_by_tracking_id", async {
            let mut tx = self.db.begin().await?;
            let record = tx
                .find_by_tracking_id(tracking_id)
                .await?
                .ok_or(CartError::OrderNotFound(tracking_id))?;
            let mut views = Self::views(&mut tx, vec![record]).await?;
            tx.rollback().await?;
            views.pop().ok_or(CartError::OrderNotFound(tracking_id))
        })
        .await
    }

    /// Orders of every user in any of `statuses`, newest first.
    pub async fn list_orders_by_status(&self, statuses: &[OrderStatus]) -> Result<Vec<OrderView>, CartError> {
        self.observed("list_orders_by_status", async {
            let mut tx = self.db.begin().await?;
            let records = tx.find_by_statuses(statuses).await?;
            let views = Self::views(&mut tx, records).await?;
            tx.rollback().await?;
            Ok(views)
        })
        .await
    }

    pub async fn count_orders_by_status(&self, status: OrderStatus) -> Result<u64, CartError> {
        self.observed("count_orders_by_status", async {
            let mut tx = self.db.begin().await?;
            let count = tx.count_by_status(status).await?;
            tx.rollback().await?;
            Ok(count)
        })
        .await
    }

    /// Placed orders with `from <= placed_at < to`, oldest first.
    pub async fn orders_placed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderView>, CartError> {
        self.observed("orders_placed_between", async {
            let mut tx = self.db.begin().await?;
            let records = tx.find_placed_between(from, to).await?;
            let views = Self::views(&mut tx, records).await?;
            tx.rollback().await?;
            Ok(views)
        })
        .await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run a command that needs the user's existing cart and no lookups.
    async fn mutate_pending(&self, user_id: Uuid, command: OrderCommand) -> Result<OrderView, CartError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut tx = self.db.begin().await?;

        let mut order = Self::load_pending(&mut tx, user_id)
            .await?
            .ok_or(CartError::CartNotFound(user_id))?;

        let events = order.execute(&command)?;
        Self::persist(&mut tx, &mut order, &events).await?;
        tx.commit().await?;

        for event in &events {
            tracing::info!(
                user_id = %user_id,
                order_id = %order.id,
                event = event.event_type(),
                status = %order.status,
                total = %order.total_amount,
                "Cart updated"
            );
        }

        Ok(OrderView::try_from(&order)?)
    }

    async fn load_pending(tx: &mut D::Tx, user_id: Uuid) -> Result<Option<OrderAggregate>, CartError> {
        let Some(record) = tx.find_pending_by_user(user_id).await? else {
            return Ok(None);
        };
        let lines = tx.find_lines_by_order(record.id).await?;
        Ok(Some(record.into_aggregate(lines)?))
    }

    async fn views(tx: &mut D::Tx, records: Vec<OrderRecord>) -> Result<Vec<OrderView>, CartError> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let lines = tx.find_lines_by_order(record.id).await?;
            views.push(OrderView::try_from(&record.into_aggregate(lines)?)?);
        }
        Ok(views)
    }

    /// Write what `events` changed. New orders are inserted at version 1;
    /// existing ones are updated only if still at the version they were read at.
    async fn persist(tx: &mut D::Tx, order: &mut OrderAggregate, events: &[OrderEvent]) -> Result<(), CartError> {
        let is_new = events.iter().any(|event| matches!(event, OrderEvent::Opened(_)));
        let expected_version = order.version();
        order.version = expected_version + 1;
        let record = OrderRecord::from_aggregate(order);

        if is_new {
            tx.insert_order(&record).await?;
        }

        for event in events {
            match event {
                OrderEvent::LineAdded(e) => tx.insert_line(&e.line).await?,
                OrderEvent::QuantityChanged(e) => tx.update_line_quantity(e.line_id, e.quantity).await?,
                OrderEvent::LineRemoved(e) => tx.delete_line(e.line_id).await?,
                OrderEvent::Opened(_)
                | OrderEvent::CouponApplied(_)
                | OrderEvent::Placed(_)
                | OrderEvent::Cancelled(_) => {}
            }
        }

        if !is_new {
            tx.update_order(&record, expected_version).await?;
        }

        tracing::debug!(
            order_id = %order.aggregate_id(),
            version = order.version(),
            events = events.len(),
            "Order written"
        );
        Ok(())
    }

    /// Call a collaborator, retrying transient failures.
    async fn lookup<T, F, Fut>(&self, collaborator: &'static str, mut call: F) -> Result<T, CartError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let metrics = self.metrics.as_deref();

        retry_on_transient(collaborator, &self.retry, |attempt| {
            tracing::debug!(collaborator, attempt, "Collaborator lookup");
            if attempt > 1 {
                if let Some(metrics) = metrics {
                    metrics.record_lookup_retry(collaborator);
                }
            }
            call()
        })
        .await
        .into_result()
        .map_err(CartError::from)
    }

    async fn observed<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, CartError>>,
    ) -> Result<T, CartError> {
        let started = Instant::now();
        let result = work.await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                tracing::debug!(operation, error = %e, kind = e.kind().as_str(), "Cart operation failed");
                e.kind().as_str()
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_operation(operation, outcome, started.elapsed().as_secs_f64());
        }

        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
