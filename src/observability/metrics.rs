//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_resolutions_total` (counter): resolutions by outcome (home, matched, not_found)
//! - `router_table_builds_total` (counter): table builds by source (cache, compiled)
//! - `router_cache_rejected_total` (counter): cache blobs discarded as unusable
//! - `router_routes` (gauge): bucketed routes in the active table
//! - `router_dispatch_errors_total` (counter): callbacks that failed to fire, by kind
//!
//! # Design Decisions
//! - Updates are no-ops until a recorder is installed (tests, CLI)
//! - Labels are static strings; no per-path cardinality

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_resolution(outcome: &'static str) {
    metrics::counter!("router_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_table_build(source: &'static str, routes: usize) {
    metrics::counter!("router_table_builds_total", "source" => source).increment(1);
    metrics::gauge!("router_routes").set(routes as f64);
}

pub fn record_cache_rejected() {
    metrics::counter!("router_cache_rejected_total").increment(1);
}

pub fn record_dispatch_error(kind: &'static str) {
    metrics::counter!("router_dispatch_errors_total", "kind" => kind).increment(1);
}
