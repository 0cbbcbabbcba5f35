use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metric descriptions so the series show up with help text on /metrics.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("chat_queries_total", "Chat queries answered, by detected category.");
        describe_counter!(
            "chat_fallback_total",
            "General queries answered with the no-matches message."
        );
        describe_histogram!("chat_response_ms", "Chat reply latency in milliseconds.");
        describe_counter!(
            "ranker_fetch_errors_total",
            "Question bank fetches that failed during ranking."
        );
        describe_histogram!(
            "ranker_candidates_returned",
            "Candidates returned per similarity search."
        );
        describe_counter!(
            "interaction_log_errors_total",
            "Consultation log writes that failed."
        );
    });
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if another recorder is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
