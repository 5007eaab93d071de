use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    register_metrics();
    handle
}

/// A handle backed by a recorder that is not installed globally.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn register_metrics() {
    // Pre-register counters so they appear even before the first increment.
    counter!("trades_ingested_total").absolute(0);
    counter!("trades_resolved_total").absolute(0);
    counter!("trades_classified_total").absolute(0);
    counter!("wallets_classified_total").absolute(0);
    counter!("relayer_submissions_total").absolute(0);
    counter!("relayer_rate_limits_total").absolute(0);
    for status in ["claimed", "failed", "skipped"] {
        counter!("claims_total", "status" => status).absolute(0);
    }

    gauge!("claim_rate_limited").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("job_duration_seconds", "job" => "startup").record(0.0);
}
