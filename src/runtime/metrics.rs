//! Prometheus exporter for the invocation metrics.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder and return its handle.
///
/// Only the first call installs anything; later calls return the same
/// handle. If another recorder already owns the process, the returned
/// handle renders an empty page.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                register_metrics();
                handle
            }
            Err(err) => {
                warn!("Metrics recorder not installed: {}", err);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

fn register_metrics() {
    describe_counter!("funcgate_invocations", "Function invocations by outcome");
    describe_histogram!(
        "funcgate_invocation_duration",
        Unit::Seconds,
        "Function invocation latency"
    );
}
