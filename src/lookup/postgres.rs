use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::order::{DiscountPercent, Money};
use super::{Catalog, Coupon, CouponLookup, LookupError, Product, UserDirectory};

// ============================================================================
// PostgreSQL-backed collaborators
// ============================================================================
//
// These read the `products`, `users` and `coupons` tables that sit next to
// the order tables (see persistence/schema.sql).
//
// ============================================================================

const GET_PRODUCT_SQL: &str = "SELECT id, price FROM products WHERE id = $1";
const USER_EXISTS_SQL: &str = "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)";
const FIND_COUPON_BY_CODE_SQL: &str =
    "SELECT code, name, discount, expires_at FROM coupons WHERE code = $1";

fn lookup_error(service: &'static str, err: sqlx::Error) -> LookupError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => LookupError::Unavailable {
            service,
            reason: err.to_string(),
        },
        other => LookupError::Invalid {
            service,
            reason: other.to_string(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, LookupError> {
        let row = sqlx::query(GET_PRODUCT_SQL)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| lookup_error("catalog", e))?;

        row.map(|row| {
            Ok(Product {
                id: row.try_get("id").map_err(|e| lookup_error("catalog", e))?,
                price: Money::from_minor(row.try_get("price").map_err(|e| lookup_error("catalog", e))?),
            })
        })
        .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, LookupError> {
        sqlx::query_scalar::<_, bool>(USER_EXISTS_SQL)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| lookup_error("user directory", e))
    }
}

#[derive(Debug, Clone)]
pub struct PgCouponLookup {
    pool: PgPool,
}

impl PgCouponLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn coupon_from_row(row: &PgRow) -> Result<Coupon, LookupError> {
        let decode = |e| lookup_error("coupons", e);

        let raw_discount: i16 = row.try_get("discount").map_err(decode)?;
        let discount = u8::try_from(raw_discount)
            .ok()
            .and_then(|pct| DiscountPercent::new(pct).ok())
            .ok_or_else(|| LookupError::Invalid {
                service: "coupons",
                reason: format!("discount out of range: {raw_discount}"),
            })?;

        Ok(Coupon {
            code: row.try_get("code").map_err(decode)?,
            name: row.try_get("name").map_err(decode)?,
            discount,
            expires_at: row
                .try_get::<Option<DateTime<Utc>>, _>("expires_at")
                .map_err(decode)?,
        })
    }
}

#[async_trait]
impl CouponLookup for PgCouponLookup {
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>, LookupError> {
        let row = sqlx::query(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| lookup_error("coupons", e))?;

        row.as_ref().map(Self::coupon_from_row).transpose()
    }
}
