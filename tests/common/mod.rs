// tests/common/mod.rs
//
// Shared helpers: fixture catalog, a scripted in-process source, and a fake
// remote API served by axum on an ephemeral port.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use tokio::sync::Notify;

use catalog_store::source::parse_catalog;
use catalog_store::{CatalogError, CatalogSource, Category, Product, ProductDraft, ProductId};

pub const PRODUCTS_JSON: &str = include_str!("../fixtures/products.json");

pub fn sample() -> Vec<Product> {
    parse_catalog(PRODUCTS_JSON).expect("fixture parses")
}

pub fn mug() -> ProductDraft {
    ProductDraft {
        title: "Mug".into(),
        price: 5.0,
        description: "D".into(),
        image: "http://x/i.png".into(),
        category: Category::Electronics,
    }
}

/// Source that counts fetches, can fail the first N, and can park each fetch
/// until the test releases it.
pub struct ScriptedSource {
    products: Vec<Product>,
    fetches: AtomicUsize,
    fail_first: AtomicUsize,
    fail_lookups: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            fetches: AtomicUsize::new(0),
            fail_first: AtomicUsize::new(0),
            fail_lookups: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn failing_first(self, n: usize) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Every single-product fetch fails as if the host were unreachable.
    pub fn failing_lookups(self) -> Self {
        self.fail_lookups.store(true, Ordering::SeqCst);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let should_fail = self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(CatalogError::Status {
                url: "scripted://products".into(),
                status: 503,
            });
        }
        Ok(self.products.clone())
    }

    async fn fetch_one(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport {
                url: format!("scripted://products/{id}"),
                message: "connection refused".into(),
            });
        }
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Serve `app` on 127.0.0.1 with an ephemeral port; returns the base URL.
pub async fn spawn_api(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake api serve");
    });
    format!("http://{addr}")
}

/// Poll until the source has started `n` fetches.
pub async fn wait_for_fetches(src: &ScriptedSource, n: usize) {
    while src.fetches() < n {
        tokio::task::yield_now().await;
    }
}
