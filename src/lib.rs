// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod id;
pub mod lookup;
pub mod metrics;
pub mod product;
pub mod source;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::CatalogConfig;
pub use crate::error::CatalogError;
pub use crate::id::{IdMatch, ProductId};
pub use crate::product::{Category, Product, ProductDraft, ProductPatch, Rating};
pub use crate::source::{CatalogSource, FixtureSource, HttpCatalogSource};
pub use crate::store::{CatalogStore, Hydration, StoreStatus};

use std::sync::Arc;

use crate::id::IdGenerator;

/// Build the store against the configured remote API.
pub fn build_store(cfg: &CatalogConfig) -> anyhow::Result<CatalogStore> {
    let source = HttpCatalogSource::from_config(cfg)?;
    tracing::info!(base_url = source.base_url(), id_match = ?cfg.id_match, "catalog source ready");
    Ok(CatalogStore::with_options(
        Arc::new(source),
        cfg.id_match,
        IdGenerator::new(),
    ))
}

/// Store plus the HTTP router over it (no `/metrics`; the server binary adds that).
pub fn app(cfg: &CatalogConfig) -> anyhow::Result<(axum::Router, CatalogStore)> {
    let store = build_store(cfg)?;
    let router = api::router(AppState {
        store: store.clone(),
    });
    Ok((router, store))
}
