//! Metrics collection and exposition.
//!
//! # Metrics
//! - `certificates_issued_total` (counter): issuance attempts by outcome
//! - `certificates_revoked_total` (counter): revocation attempts by outcome
//! - `ledger_submissions_total` (counter): broadcasts by kind (issue, revoke)
//! - `ledger_receipt_wait_seconds` (histogram): time spent waiting for receipts
//! - `ledger_rpc_healthy` (gauge): 1=reachable, 0=unreachable

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of an issuance attempt.
pub fn record_issuance(outcome: &'static str) {
    metrics::counter!("certificates_issued_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of a revocation attempt.
pub fn record_revocation(outcome: &'static str) {
    metrics::counter!("certificates_revoked_total", "outcome" => outcome).increment(1);
}

/// Record a transaction broadcast.
pub fn record_submission(kind: &'static str) {
    metrics::counter!("ledger_submissions_total", "kind" => kind).increment(1);
}

/// Record how long a receipt wait took.
pub fn record_receipt_wait(elapsed: Duration) {
    metrics::histogram!("ledger_receipt_wait_seconds").record(elapsed.as_secs_f64());
}

/// Record ledger reachability.
pub fn record_ledger_health(healthy: bool) {
    metrics::gauge!("ledger_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}
