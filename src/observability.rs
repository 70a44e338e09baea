use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: consolidation runs completed.
pub const CONSOLIDATIONS_TOTAL: &str = "coalesce_consolidations_total";

/// Histogram: consolidation latency in seconds (load through reconcile).
pub const CONSOLIDATION_DURATION_SECONDS: &str = "coalesce_consolidation_duration_seconds";

// ── Reconciliation outcome metrics ──────────────────────────────

/// Counter: original events deleted because they merged into a cluster.
pub const EVENTS_DELETED_TOTAL: &str = "coalesce_events_deleted_total";

/// Counter: consolidated events created.
pub const EVENTS_CREATED_TOTAL: &str = "coalesce_events_created_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Default fmt subscriber for embedders that don't install their own.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
