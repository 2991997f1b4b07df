//! Operability metrics (spec.md §1's ambient stack: carried even though the
//! RPC/metrics server itself is out of scope). Grounded on the teacher's
//! `metrics-runtime` install-once-at-startup pattern
//! (`zebrad/src/application.rs`), updated to the modern `metrics`/
//! `metrics-exporter-prometheus` crates the teacher's own version predates.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install a Prometheus exporter listening on `addr`, exposing every gauge
/// recorded through the `metrics` facade for the remainder of the process.
pub fn install(addr: SocketAddr) -> color_eyre::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

pub fn record_tip_height(height: u32) {
    metrics::gauge!("emberd_tip_height").set(height as f64);
}

pub fn record_mempool_size(bytes: usize, count: usize) {
    metrics::gauge!("emberd_mempool_bytes").set(bytes as f64);
    metrics::gauge!("emberd_mempool_count").set(count as f64);
}
