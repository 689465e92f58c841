// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the cart service
// ============================================================================
//
// - Cart operations by name and outcome, with latency
// - Collaborator lookup retries
// - Orders placed
//
// All metrics are registered with one Registry and scraped via /metrics
// ============================================================================

pub struct CartMetrics {
    registry: Registry,

    pub operations_total: IntCounterVec,
    pub operation_duration: HistogramVec,
    pub lookup_retries: IntCounterVec,
    pub orders_placed: IntCounter,
}

impl CartMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("cart_operations_total", "Cart operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("cart_operation_duration_seconds", "Cart operation latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let lookup_retries = IntCounterVec::new(
            Opts::new("cart_lookup_retries_total", "Retried collaborator lookups"),
            &["collaborator"],
        )?;
        registry.register(Box::new(lookup_retries.clone()))?;

        let orders_placed = IntCounter::new("orders_placed_total", "Orders placed")?;
        registry.register(Box::new(orders_placed.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_duration,
            lookup_retries,
            orders_placed,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// `outcome` is "ok" or an error kind label.
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.operations_total.with_label_values(&[operation, outcome]).inc();
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    pub fn record_lookup_retry(&self, collaborator: &str) {
        self.lookup_retries.with_label_values(&[collaborator]).inc();
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.inc();
    }
}
