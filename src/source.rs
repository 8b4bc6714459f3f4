// src/source.rs
//! Remote catalog source: the read-only side of the catalog.
//!
//! `HttpCatalogSource` talks to a fakestoreapi-compatible REST API;
//! `FixtureSource` serves a fixed snapshot parsed through the same boundary.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::id::ProductId;
use crate::metrics::ensure_metrics_described;
use crate::product::{Product, RecordError};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Full collection snapshot (`GET /products`), in remote order.
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError>;

    /// Single product (`GET /products/{id}`). A non-success answer or an empty
    /// body is `Ok(None)`; only transport failures are errors.
    async fn fetch_one(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;

    fn name(&self) -> &'static str;
}

pub struct HttpCatalogSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogSource {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("catalog-store/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        Self::new(
            &cfg.base_url,
            Duration::from_secs(cfg.request_timeout_secs),
            Duration::from_secs(cfg.connect_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(url: &str, e: reqwest::Error) -> CatalogError {
    CatalogError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        ensure_metrics_described();
        let url = self.url("/products");
        let t0 = Instant::now();

        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, %url, "catalog http error");
                return Err(transport(&url, e));
            }
        };
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(|e| transport(&url, e))?;

        histogram!("catalog_remote_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        parse_catalog(&body)
    }

    async fn fetch_one(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let url = self.url(&format!("/products/{id}"));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        if !resp.status().is_success() {
            tracing::debug!(%id, status = resp.status().as_u16(), "remote product not found");
            return Ok(None);
        }
        let body = resp.text().await.map_err(|e| transport(&url, e))?;
        Ok(parse_single(&body))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Parse a `GET /products` body. The body must be a JSON array; records that
/// fail validation or repeat an earlier id are dropped and counted.
pub fn parse_catalog(body: &str) -> Result<Vec<Product>, CatalogError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;

    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let checked = Product::from_remote(value).and_then(|p| {
            if seen.insert(p.id) {
                Ok(p)
            } else {
                Err(RecordError::Duplicate(p.id))
            }
        });
        match checked {
            Ok(p) => out.push(p),
            Err(e) => {
                tracing::warn!(error = %e, "rejected remote product record");
                counter!("catalog_records_rejected_total").increment(1);
            }
        }
    }
    Ok(out)
}

/// Parse a `GET /products/{id}` body. The demo API answers unknown ids with
/// `200` and an empty body, so anything unusable here means "not found".
pub fn parse_single(body: &str) -> Option<Product> {
    if body.trim().is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match Product::from_remote(value) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::debug!(error = %e, "remote single product rejected");
            None
        }
    }
}

/// Fixed snapshot source (tests, offline probes).
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    products: Vec<Product>,
}

impl FixtureSource {
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn from_json(body: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            products: parse_catalog(body)?,
        })
    }
}

#[async_trait]
impl CatalogSource for FixtureSource {
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }

    async fn fetch_one(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
