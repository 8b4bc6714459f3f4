//! Catalog service binary entrypoint.
//! Boots the Axum HTTP server over an in-memory catalog seeded from the remote API.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catalog_store::{config::load_config_default, metrics::Metrics};

/// Compact logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_store=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading catalog config")?;

    // Recorder must be installed before the store describes its series.
    let metrics = if cfg.metrics {
        Some(Metrics::init()?)
    } else {
        None
    };

    let (mut router, _store) = catalog_store::app(&cfg)?;
    if let Some(m) = &metrics {
        router = router.merge(m.router());
    }

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, metrics = cfg.metrics, "catalog service listening");

    axum::serve(listener, router).await.context("serving http")?;
    Ok(())
}
