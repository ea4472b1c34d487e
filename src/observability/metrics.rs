//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (queries, latency, errors, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `linequery_queries_total` (counter): queries by verdict, strategy
//! - `linequery_query_duration_seconds` (histogram): match latency
//! - `linequery_active_connections` (gauge): current connection count
//! - `linequery_protocol_errors_total` (counter): framing failures by kind
//! - `linequery_dataset_reloads_total` (counter): reloads by outcome
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Labels are static strings to keep cardinality bounded

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::matching::{Strategy, Verdict};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one answered query.
pub fn record_query(verdict: Verdict, strategy: Strategy, elapsed: Duration) {
    counter!(
        "linequery_queries_total",
        "verdict" => verdict.as_str(),
        "strategy" => strategy.as_str()
    )
    .increment(1);
    histogram!("linequery_query_duration_seconds", "strategy" => strategy.as_str())
        .record(elapsed.as_secs_f64());
}

/// Record a framing failure.
pub fn record_protocol_error(kind: &'static str) {
    counter!("linequery_protocol_errors_total", "kind" => kind).increment(1);
}

pub fn set_active_connections(count: u64) {
    gauge!("linequery_active_connections").set(count as f64);
}

/// Record a dataset load attempt.
pub fn record_dataset_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("linequery_dataset_reloads_total", "outcome" => outcome).increment(1);
}
