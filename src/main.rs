use std::sync::Arc;

use chrono::{Duration, Utc};
use futures_util::future::join_all;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use cart_orders::config::AppConfig;
use cart_orders::domain::order::{DiscountPercent, Money, OrderStatus};
use cart_orders::lookup::{
    Coupon, InMemoryCatalog, InMemoryCoupons, InMemoryUsers, PgCatalog, PgCouponLookup, PgUserDirectory,
};
use cart_orders::metrics::{self, CartMetrics};
use cart_orders::persistence::{Database, InMemoryDatabase, PgDatabase};
use cart_orders::service::CartService;

/// Fixed data the demo seeds into whichever backend it runs against.
struct DemoData {
    user_id: Uuid,
    products: Vec<(Uuid, Money)>,
    coupon: Coupon,
}

impl DemoData {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            user_id: Uuid::new_v4(),
            products: vec![
                (Uuid::new_v4(), Money::from_minor(1_250)),
                (Uuid::new_v4(), Money::from_minor(899)),
                (Uuid::new_v4(), Money::from_minor(4_000)),
            ],
            coupon: Coupon {
                code: "WELCOME10".to_string(),
                name: "Welcome discount".to_string(),
                discount: DiscountPercent::new(10)?,
                expires_at: Some(Utc::now() + Duration::days(30)),
            },
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Structured logging; RUST_LOG (or --log-level) sets the filter
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🚀 Starting cart/order service demo");

    // === 1. Prometheus metrics ===
    let metrics = Arc::new(CartMetrics::new()?);
    if config.metrics_enabled {
        let registry = Arc::new(metrics.registry().clone());
        let port = config.metrics_port;
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(registry, port)) {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    }

    // === 2. Storage and collaborators ===
    let demo = DemoData::new()?;
    let retry = config.retry_config();

    match &config.database_url {
        Some(url) => {
            tracing::info!("Using PostgreSQL storage");
            let db = PgDatabase::connect(url, config.database_max_connections).await?;
            db.ensure_schema().await?;

            db.upsert_user(demo.user_id).await?;
            for (product_id, price) in &demo.products {
                db.upsert_product(*product_id, *price).await?;
            }
            db.upsert_coupon(&demo.coupon).await?;

            let pool = db.pool().clone();
            let service = CartService::new(
                db,
                Arc::new(PgCatalog::new(pool.clone())),
                Arc::new(PgUserDirectory::new(pool.clone())),
                Arc::new(PgCouponLookup::new(pool)),
            )
            .with_retry(retry)
            .with_metrics(metrics.clone());

            run_demo(&service, &demo).await?;
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory storage");
            let catalog = demo
                .products
                .iter()
                .fold(InMemoryCatalog::new(), |catalog, (id, price)| catalog.with_product(*id, *price));

            let service = CartService::new(
                InMemoryDatabase::new(),
                Arc::new(catalog),
                Arc::new(InMemoryUsers::new().with_user(demo.user_id)),
                Arc::new(InMemoryCoupons::new().with_coupon(demo.coupon.clone())),
            )
            .with_retry(retry)
            .with_metrics(metrics.clone());

            run_demo(&service, &demo).await?;
        }
    }

    tracing::info!("🎉 Demo complete!");

    if config.metrics_enabled {
        tracing::info!("Metrics remain available on port {}; press Ctrl+C to exit", config.metrics_port);
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

/// Walk one cart through its whole lifecycle.
async fn run_demo<D: Database>(service: &CartService<D>, demo: &DemoData) -> anyhow::Result<()> {
    let user_id = demo.user_id;

    // Concurrent adds for different products all land in the cart
    let adds = demo
        .products
        .iter()
        .map(|(product_id, _)| service.add_item(user_id, *product_id));
    for result in join_all(adds).await {
        let line = result?;
        tracing::info!("✅ Added product {} at {}", line.product_id, line.unit_price);
    }

    let (first_product, _) = demo.products[0];
    let (last_product, _) = demo.products[demo.products.len() - 1];

    let cart = service.increase_quantity(user_id, first_product).await?;
    tracing::info!("🛒 Subtotal {} after increasing quantity", cart.subtotal);

    let cart = service.apply_coupon(user_id, &demo.coupon.code).await?;
    tracing::info!(
        "🏷️  Coupon {} applied: subtotal {}, discount {}, total {}",
        demo.coupon.code,
        cart.subtotal,
        cart.discount,
        cart.total_amount
    );

    let cart = service.decrease_quantity(user_id, last_product).await?;
    tracing::info!("🛒 {} lines left, total {}", cart.lines.len(), cart.total_amount);

    if let Err(e) = service.add_item(user_id, first_product).await {
        tracing::info!("Duplicate add rejected as expected: {}", e);
    }

    let placed = service
        .place_order(user_id, Some("221B Baker Street".to_string()), Some("Demo order".to_string()))
        .await?;
    let tracking_id = placed
        .tracking_id
        .ok_or_else(|| anyhow::anyhow!("placed order has no tracking id"))?;
    tracing::info!("📦 Order placed, tracking id {}", tracking_id);

    let found = service.find_by_tracking_id(tracking_id).await?;
    tracing::info!("🔎 Tracking lookup found order {:?} ({})", found.id, found.status);

    let history = service.list_placed_orders(user_id).await?;
    tracing::info!("📜 User has {} closed orders", history.len());

    let pending = service.count_orders_by_status(OrderStatus::Pending).await?;
    let placed_count = service.count_orders_by_status(OrderStatus::Placed).await?;
    tracing::info!("📊 Orders: {} pending, {} placed", pending, placed_count);

    let cart = service.get_cart(user_id).await?;
    tracing::info!("🛒 Fresh cart after placement: {:?}, {} lines", cart.id, cart.lines.len());

    Ok(())
}
