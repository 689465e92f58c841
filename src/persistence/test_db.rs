//! Throwaway PostgreSQL databases for the sqlx-backed tests

use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::PgDatabase;

const USER: &str = "cart_test";
const PASSWORD: &str = "cart_test_password";

/// One container per test binary. The mapped port is read while the
/// runtime that started the container is still alive.
static POSTGRES: OnceCell<(ContainerAsync<PostgresImage>, u16)> = OnceCell::const_new();

async fn start_postgres() -> (ContainerAsync<PostgresImage>, u16) {
    let container = PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("cart_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    (container, port)
}

fn url(port: u16, db_name: &str) -> String {
    let host = std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());
    format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{db_name}")
}

/// A freshly created database with the schema applied.
///
/// Every call gets its own database inside the shared container, so tests
/// commit normally and never see each other's rows.
pub(crate) async fn fresh_database() -> PgDatabase {
    let (_, port) = POSTGRES.get_or_init(start_postgres).await;
    let db_name = format!("cart_orders_{}", Uuid::new_v4().simple());

    let mut admin = PgConnection::connect(&url(*port, "postgres"))
        .await
        .expect("Failed to connect to postgres database");
    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&mut admin)
        .await
        .expect("Failed to create test database");
    admin.close().await.expect("Failed to close admin connection");

    let pool = PgPool::connect(&url(*port, &db_name))
        .await
        .expect("Failed to create pool for database");

    let db = PgDatabase::new(pool);
    db.ensure_schema().await.expect("Failed to apply schema");
    db
}
