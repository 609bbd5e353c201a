//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bootstrap_component_duration_seconds` (histogram): per-component init time
//! - `bootstrap_component_failures_total` (counter): failed initializers
//! - `bootstrap_runs_total` (counter): init attempts by outcome
//! - `bootstrap_duration_seconds` (histogram): whole-run time
//! - `bootstrap_initialized` (gauge): 1 after a successful run

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use thiserror::Error;

use crate::bootstrap::ComponentName;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    describe_metrics();

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_histogram!(
        "bootstrap_component_duration_seconds",
        "Time taken to initialize each component"
    );
    describe_counter!(
        "bootstrap_component_failures_total",
        "Component initializers that failed"
    );
    describe_counter!("bootstrap_runs_total", "Bootstrap attempts by outcome");
    describe_histogram!("bootstrap_duration_seconds", "Time taken by a whole bootstrap run");
    describe_gauge!("bootstrap_initialized", "1 when the application is initialized");
}

pub fn record_component_init(component: ComponentName, duration: Duration) {
    histogram!("bootstrap_component_duration_seconds", "component" => component.as_str())
        .record(duration.as_secs_f64());
}

pub fn record_component_failure(component: ComponentName) {
    counter!("bootstrap_component_failures_total", "component" => component.as_str()).increment(1);
}

pub fn record_bootstrap_outcome(success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!("bootstrap_runs_total", "outcome" => outcome).increment(1);
    histogram!("bootstrap_duration_seconds").record(duration.as_secs_f64());
    gauge!("bootstrap_initialized").set(if success { 1.0 } else { 0.0 });
}
