//! Probe: hydrate once and print a short summary of the catalog.
//!
//! `catalog-probe` hits the configured remote API;
//! `catalog-probe path/to/products.json` reads a local snapshot instead.

use std::sync::Arc;

use anyhow::Context;
use catalog_store::{config::load_config_default, CatalogStore, FixtureSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let store = match std::env::args().nth(1) {
        Some(path) => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("reading fixture {path}"))?;
            CatalogStore::new(Arc::new(FixtureSource::from_json(&body)?))
        }
        None => {
            let cfg = load_config_default()?;
            catalog_store::build_store(&cfg)?
        }
    };

    let outcome = store.hydrate().await?;
    println!("hydrate: {outcome:?}");
    for p in store.products().iter().take(10) {
        println!(
            "{:>4}  {:<9.2}  {:<18}  {}",
            p.id,
            p.price,
            p.category.as_str(),
            p.title
        );
    }
    println!("catalog-probe done ({} products)", store.len());
    Ok(())
}
