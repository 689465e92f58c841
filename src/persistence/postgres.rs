use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, Row,
};
use uuid::Uuid;

use crate::domain::order::{AppliedCoupon, CartLine, DiscountPercent, Money, OrderStatus};
use crate::lookup::Coupon;
use super::{
    CartLineRepository, Database, OrderRecord, OrderRepository, PersistenceError, Transaction,
};

// ============================================================================
// PostgreSQL store
// ============================================================================
//
// Every cart operation runs inside one `sqlx::Transaction`. Order updates are
// conditional on the stored version; a miss surfaces as `VersionConflict`.
// The partial unique index on (user_id) WHERE status = 'pending' backs the
// one-pending-cart rule.
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, user_id, status, subtotal, discount, total_amount, \
     coupon_code, coupon_name, coupon_discount, tracking_id, placed_at, address, \
     description, cancelled_reason, created_at, updated_at, version";

const LINE_COLUMNS: &str = "id, order_id, product_id, unit_price, quantity, added_at";

const INSERT_ORDER_SQL: &str = r#"
    INSERT INTO orders (
        id, user_id, status, subtotal, discount, total_amount,
        coupon_code, coupon_name, coupon_discount, tracking_id, placed_at, address,
        description, cancelled_reason, created_at, updated_at, version
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
"#;

const UPDATE_ORDER_SQL: &str = r#"
    UPDATE orders SET
        status = $3, subtotal = $4, discount = $5, total_amount = $6,
        coupon_code = $7, coupon_name = $8, coupon_discount = $9, tracking_id = $10,
        placed_at = $11, address = $12, description = $13, cancelled_reason = $14,
        updated_at = $15, version = $16
    WHERE id = $1 AND version = $2
"#;

const INSERT_LINE_SQL: &str = r#"
    INSERT INTO cart_lines (id, order_id, product_id, unit_price, quantity, added_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Seeding helpers for the collaborator tables (local demo only)

    pub async fn upsert_user(&self, user_id: Uuid) -> Result<(), PersistenceError> {
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn upsert_product(&self, product_id: Uuid, price: Money) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO products (id, price) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET price = EXCLUDED.price",
        )
        .bind(product_id)
        .bind(price.minor_units())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_coupon(&self, coupon: &Coupon) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO coupons (code, name, discount, expires_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, \
             discount = EXCLUDED.discount, expires_at = EXCLUDED.expires_at",
        )
        .bind(&coupon.code)
        .bind(&coupon.name)
        .bind(i16::from(coupon.discount.value()))
        .bind(coupon.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<Self::Tx, PersistenceError> {
        Ok(PgTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn map_unique_violation(err: sqlx::Error, what: impl FnOnce() -> String) -> PersistenceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => PersistenceError::Duplicate(what()),
        _ => PersistenceError::Database(err),
    }
}

fn status_names(statuses: &[OrderStatus]) -> Vec<&'static str> {
    statuses.iter().map(OrderStatus::as_str).collect()
}

fn order_from_row(row: &PgRow) -> Result<OrderRecord, PersistenceError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

    let coupon_code: Option<String> = row.try_get("coupon_code")?;
    let coupon = match coupon_code {
        Some(code) => {
            let raw: Option<i16> = row.try_get("coupon_discount")?;
            let discount = raw
                .and_then(|pct| u8::try_from(pct).ok())
                .and_then(|pct| DiscountPercent::new(pct).ok())
                .ok_or_else(|| PersistenceError::Corrupt(format!("coupon discount out of range: {raw:?}")))?;
            Some(AppliedCoupon {
                code,
                name: row.try_get::<Option<String>, _>("coupon_name")?.unwrap_or_default(),
                discount,
            })
        }
        None => None,
    };

    Ok(OrderRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        status,
        subtotal: Money::from_minor(row.try_get("subtotal")?),
        discount: Money::from_minor(row.try_get("discount")?),
        total_amount: Money::from_minor(row.try_get("total_amount")?),
        coupon,
        tracking_id: row.try_get("tracking_id")?,
        placed_at: row.try_get("placed_at")?,
        address: row.try_get("address")?,
        description: row.try_get("description")?,
        cancelled_reason: row.try_get("cancelled_reason")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<CartLine, PersistenceError> {
    let quantity: i32 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| PersistenceError::Corrupt(format!("negative quantity: {quantity}")))?;

    Ok(CartLine {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        unit_price: Money::from_minor(row.try_get("unit_price")?),
        quantity,
        added_at: row.try_get("added_at")?,
    })
}

fn quantity_param(quantity: u32) -> Result<i32, PersistenceError> {
    i32::try_from(quantity).map_err(|_| PersistenceError::Corrupt(format!("quantity too large: {quantity}")))
}

fn coupon_params(order: &OrderRecord) -> (Option<&str>, Option<&str>, Option<i16>) {
    match &order.coupon {
        Some(coupon) => (
            Some(coupon.code.as_str()),
            Some(coupon.name.as_str()),
            Some(i16::from(coupon.discount.value())),
        ),
        None => (None, None, None),
    }
}

impl PgTransaction {
    async fn fetch_orders(&mut self, sql: &str, binder: OrderFilter<'_>) -> Result<Vec<OrderRecord>, PersistenceError> {
        let query = sqlx::query(sql);
        let query = match binder {
            OrderFilter::User(user_id) => query.bind(user_id),
            OrderFilter::Tracking(tracking_id) => query.bind(tracking_id),
            OrderFilter::UserStatuses(user_id, statuses) => query.bind(user_id).bind(statuses),
            OrderFilter::Statuses(statuses) => query.bind(statuses),
            OrderFilter::PlacedWindow(from, to) => query.bind(from).bind(to),
        };

        let rows = query.fetch_all(&mut *self.tx).await?;
        rows.iter().map(order_from_row).collect()
    }
}

enum OrderFilter<'a> {
    User(Uuid),
    Tracking(Uuid),
    UserStatuses(Uuid, Vec<&'a str>),
    Statuses(Vec<&'a str>),
    PlacedWindow(DateTime<Utc>, DateTime<Utc>),
}

#[async_trait]
impl OrderRepository for PgTransaction {
    async fn find_pending_by_user(&mut self, user_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND status = 'pending' FOR UPDATE"
        );
        Ok(self.fetch_orders(&sql, OrderFilter::User(user_id)).await?.into_iter().next())
    }

    async fn find_by_tracking_id(&mut self, tracking_id: Uuid) -> Result<Option<OrderRecord>, PersistenceError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE tracking_id = $1");
        Ok(self
            .fetch_orders(&sql, OrderFilter::Tracking(tracking_id))
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_user_and_statuses(
        &mut self,
        user_id: Uuid,
        statuses: &[OrderStatus],
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND status = ANY($2) \
             ORDER BY created_at DESC, id DESC"
        );
        self.fetch_orders(&sql, OrderFilter::UserStatuses(user_id, status_names(statuses)))
            .await
    }

    async fn find_by_statuses(&mut self, statuses: &[OrderStatus]) -> Result<Vec<OrderRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ANY($1) ORDER BY created_at DESC, id DESC"
        );
        self.fetch_orders(&sql, OrderFilter::Statuses(status_names(statuses)))
            .await
    }

    async fn find_placed_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status = 'placed' AND placed_at >= $1 AND placed_at < $2 \
             ORDER BY placed_at ASC"
        );
        self.fetch_orders(&sql, OrderFilter::PlacedWindow(from, to)).await
    }

    async fn count_by_status(&mut self, status: OrderStatus) -> Result<u64, PersistenceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert_order(&mut self, order: &OrderRecord) -> Result<(), PersistenceError> {
        let (coupon_code, coupon_name, coupon_discount) = coupon_params(order);

        sqlx::query(INSERT_ORDER_SQL)
            .bind(order.id)
            .bind(order.user_id)
            .bind(order.status.as_str())
            .bind(order.subtotal.minor_units())
            .bind(order.discount.minor_units())
            .bind(order.total_amount.minor_units())
            .bind(coupon_code)
            .bind(coupon_name)
            .bind(coupon_discount)
            .bind(order.tracking_id)
            .bind(order.placed_at)
            .bind(order.address.as_deref())
            .bind(order.description.as_deref())
            .bind(order.cancelled_reason.as_deref())
            .bind(order.created_at)
            .bind(order.updated_at)
            .bind(order.version)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || format!("order {} for user {}", order.id, order.user_id)))?;

        Ok(())
    }

    async fn update_order(&mut self, order: &OrderRecord, expected_version: i64) -> Result<(), PersistenceError> {
        let (coupon_code, coupon_name, coupon_discount) = coupon_params(order);

        let result = sqlx::query(UPDATE_ORDER_SQL)
            .bind(order.id)
            .bind(expected_version)
            .bind(order.status.as_str())
            .bind(order.subtotal.minor_units())
            .bind(order.discount.minor_units())
            .bind(order.total_amount.minor_units())
            .bind(coupon_code)
            .bind(coupon_name)
            .bind(coupon_discount)
            .bind(order.tracking_id)
            .bind(order.placed_at)
            .bind(order.address.as_deref())
            .bind(order.description.as_deref())
            .bind(order.cancelled_reason.as_deref())
            .bind(order.updated_at)
            .bind(order.version)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || format!("order {}", order.id)))?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::VersionConflict {
                order_id: order.id,
                expected: expected_version,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl CartLineRepository for PgTransaction {
    async fn find_lines_by_order(&mut self, order_id: Uuid) -> Result<Vec<CartLine>, PersistenceError> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM cart_lines WHERE order_id = $1 ORDER BY added_at, id");
        let rows = sqlx::query(&sql)
            .bind(order_id)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(line_from_row).collect()
    }

    async fn find_line_by_order_and_product(
        &mut self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, PersistenceError> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM cart_lines WHERE order_id = $1 AND product_id = $2");
        let row = sqlx::query(&sql)
            .bind(order_id)
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(line_from_row).transpose()
    }

    async fn insert_line(&mut self, line: &CartLine) -> Result<(), PersistenceError> {
        sqlx::query(INSERT_LINE_SQL)
            .bind(line.id)
            .bind(line.order_id)
            .bind(line.product_id)
            .bind(line.unit_price.minor_units())
            .bind(quantity_param(line.quantity)?)
            .bind(line.added_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("line for product {} on order {}", line.product_id, line.order_id)
                })
            })?;

        Ok(())
    }

    async fn update_line_quantity(&mut self, line_id: Uuid, quantity: u32) -> Result<(), PersistenceError> {
        let result = sqlx::query("UPDATE cart_lines SET quantity = $2 WHERE id = $1")
            .bind(line_id)
            .bind(quantity_param(quantity)?)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::MissingRow(format!("cart line {line_id}")));
        }
        Ok(())
    }

    async fn delete_line(&mut self, line_id: Uuid) -> Result<(), PersistenceError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(line_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::MissingRow(format!("cart line {line_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), PersistenceError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PersistenceError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderAggregate;
    use crate::persistence::test_db::fresh_database;
    use chrono::TimeZone;

    fn pending_record(user_id: Uuid) -> OrderRecord {
        let (mut order, _) = OrderAggregate::open(Uuid::new_v4(), user_id).unwrap();
        order.version = 1;
        OrderRecord::from_aggregate(&order)
    }

    fn placed_record(placed_at: DateTime<Utc>) -> OrderRecord {
        OrderRecord {
            status: OrderStatus::Placed,
            tracking_id: Some(Uuid::new_v4()),
            placed_at: Some(placed_at),
            ..pending_record(Uuid::new_v4())
        }
    }

    fn line_for(order_id: Uuid, product_id: Uuid) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            unit_price: Money::from_minor(40),
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    async fn commit_order(db: &PgDatabase, order: &OrderRecord) {
        let mut tx = db.begin().await.unwrap();
        tx.insert_order(order).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_is_visible_and_rollback_is_not() {
        let db = fresh_database().await;
        let user_id = Uuid::new_v4();
        let order = pending_record(user_id);

        let mut tx = db.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.insert_line(&line_for(order.id, Uuid::new_v4())).await.unwrap();
        tx.rollback().await.unwrap();

        // Dropping without commit discards as well
        let mut tx = db.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        drop(tx);

        let mut tx = db.begin().await.unwrap();
        assert!(tx.find_pending_by_user(user_id).await.unwrap().is_none());

        let line = line_for(order.id, Uuid::new_v4());
        tx.insert_order(&order).await.unwrap();
        tx.insert_line(&line).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let stored = tx.find_pending_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(stored.id, order.id);
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(stored.version, 1);

        let lines = tx.find_lines_by_order(order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, line.id);
        assert_eq!(lines[0].unit_price, line.unit_price);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(
            tx.find_line_by_order_and_product(order.id, line.product_id)
                .await
                .unwrap()
                .map(|l| l.id),
            Some(line.id)
        );
    }

    #[tokio::test]
    async fn test_stale_update_is_version_conflict() {
        let db = fresh_database().await;
        let order = pending_record(Uuid::new_v4());
        commit_order(&db, &order).await;

        let updated = OrderRecord {
            version: 2,
            address: Some("1 Main St".to_string()),
            ..order.clone()
        };
        let mut tx = db.begin().await.unwrap();
        tx.update_order(&updated, 1).await.unwrap();
        tx.commit().await.unwrap();

        // A writer that read version 1 has lost the race
        let stale = OrderRecord { version: 2, ..order.clone() };
        let mut tx = db.begin().await.unwrap();
        let err = tx.update_order(&stale, 1).await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::VersionConflict { order_id, expected: 1 } if order_id == order.id
        ));
        drop(tx);

        let mut tx = db.begin().await.unwrap();
        let stored = tx.find_pending_by_user(order.user_id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.address.as_deref(), Some("1 Main St"));
    }

    #[tokio::test]
    async fn test_second_pending_order_is_duplicate() {
        let db = fresh_database().await;
        let user_id = Uuid::new_v4();
        commit_order(&db, &pending_record(user_id)).await;

        let mut tx = db.begin().await.unwrap();
        let err = tx.insert_order(&pending_record(user_id)).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Duplicate(_)), "unexpected {err:?}");
    }

    #[tokio::test]
    async fn test_duplicate_line_is_duplicate() {
        let db = fresh_database().await;
        let order = pending_record(Uuid::new_v4());
        let product_id = Uuid::new_v4();

        let mut tx = db.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.insert_line(&line_for(order.id, product_id)).await.unwrap();
        let err = tx.insert_line(&line_for(order.id, product_id)).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Duplicate(_)), "unexpected {err:?}");
    }

    #[tokio::test]
    async fn test_line_quantity_update_and_delete() {
        let db = fresh_database().await;
        let order = pending_record(Uuid::new_v4());
        let line = line_for(order.id, Uuid::new_v4());

        let mut tx = db.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.insert_line(&line).await.unwrap();
        tx.update_line_quantity(line.id, 3).await.unwrap();
        assert_eq!(tx.find_lines_by_order(order.id).await.unwrap()[0].quantity, 3);

        tx.delete_line(line.id).await.unwrap();
        assert!(tx.find_lines_by_order(order.id).await.unwrap().is_empty());
        assert!(matches!(
            tx.delete_line(line.id).await.unwrap_err(),
            PersistenceError::MissingRow(_)
        ));
        assert!(matches!(
            tx.update_line_quantity(line.id, 2).await.unwrap_err(),
            PersistenceError::MissingRow(_)
        ));
    }

    #[tokio::test]
    async fn test_placed_between_includes_start_and_excludes_end() {
        let db = fresh_database().await;
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let middle = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();

        let at_start = placed_record(start);
        let in_window = placed_record(middle);
        let at_end = placed_record(end);
        for order in [&in_window, &at_end, &at_start] {
            commit_order(&db, order).await;
        }
        commit_order(&db, &pending_record(Uuid::new_v4())).await;

        let mut tx = db.begin().await.unwrap();
        let found = tx.find_placed_between(start, end).await.unwrap();
        let ids: Vec<Uuid> = found.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![at_start.id, in_window.id]);
        assert_eq!(found[0].placed_at, Some(start));

        assert_eq!(tx.count_by_status(OrderStatus::Placed).await.unwrap(), 3);
        assert_eq!(tx.count_by_status(OrderStatus::Pending).await.unwrap(), 1);
        assert_eq!(
            tx.find_by_statuses(&[OrderStatus::Placed, OrderStatus::Cancelled])
                .await
                .unwrap()
                .len(),
            3
        );

        let tracked = tx
            .find_by_tracking_id(at_end.tracking_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracked.id, at_end.id);
    }

    #[test]
    fn test_status_names_match_schema_values() {
        assert_eq!(
            status_names(&[OrderStatus::Placed, OrderStatus::Cancelled]),
            vec!["placed", "cancelled"]
        );
    }

    #[test]
    fn test_coupon_params_flatten_applied_coupon() {
        let (mut order, _) = crate::domain::order::OrderAggregate::open(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(coupon_params(&OrderRecord::from_aggregate(&order)), (None, None, None));

        order.coupon = Some(AppliedCoupon {
            code: "SPRING".to_string(),
            name: "Spring sale".to_string(),
            discount: DiscountPercent::new(15).unwrap(),
        });
        let record = OrderRecord::from_aggregate(&order);
        assert_eq!(coupon_params(&record), (Some("SPRING"), Some("Spring sale"), Some(15)));
    }

    #[test]
    fn test_quantity_param_rejects_overflow() {
        assert_eq!(quantity_param(7).unwrap(), 7);
        assert!(matches!(quantity_param(u32::MAX), Err(PersistenceError::Corrupt(_))));
    }
}
