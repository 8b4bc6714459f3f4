use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("catalog_hydrate_total", "Hydrate fetches issued to the remote catalog.");
        describe_counter!(
            "catalog_hydrate_errors_total",
            "Hydrate fetches that failed (transport, status, decode)."
        );
        describe_counter!(
            "catalog_records_rejected_total",
            "Remote product records refused at the parsing boundary."
        );
        describe_counter!(
            "catalog_mutations_total",
            "Local create/update/delete operations, labelled by op."
        );
        describe_counter!(
            "catalog_remote_lookups_total",
            "Single-product fallbacks to the remote catalog."
        );
        describe_histogram!("catalog_remote_fetch_ms", "Remote list fetch time in milliseconds.");
        describe_gauge!("catalog_products", "Products currently held in the store.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
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
