// src/store.rs
//! # Catalog Store
//! In-memory product collection seeded from a read-only [`CatalogSource`].
//!
//! All mutations stay local: nothing is ever written back to the source.
//! Every synchronous operation runs inside one short critical section, so no
//! caller observes a half-applied change. `hydrate` is the only async
//! operation and is single-flight: concurrent callers share one fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::id::{IdGenerator, IdMatch, IdQuery, ProductId};
use crate::metrics::ensure_metrics_described;
use crate::product::{Product, ProductDraft, ProductPatch};
use crate::source::CatalogSource;

/// Where the store stands with respect to the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreStatus {
    /// Nothing fetched yet.
    Idle,
    /// A hydrate fetch is in flight.
    Loading,
    /// Seeded from the source.
    Ready,
    /// Last hydrate failed; a retry is allowed.
    Failed { message: String },
}

/// What a successful `hydrate` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// This call fetched and stored `n` products.
    Fetched(usize),
    /// This call waited on another caller's fetch, which stored `n` products.
    Joined(usize),
    /// Collection was already non-empty; nothing fetched.
    AlreadyPopulated,
}

struct Inner {
    products: Vec<Product>,
    ids: IdGenerator,
    status: StoreStatus,
    last_outcome: Option<Result<usize, CatalogError>>,
}

struct Shared {
    inner: RwLock<Inner>,
    source: Arc<dyn CatalogSource>,
    id_match: IdMatch,
    hydrate_gate: tokio::sync::Mutex<()>,
    attempts: AtomicU64,
}

/// Cheap, cloneable handle. Clones share one collection.
#[derive(Clone)]
pub struct CatalogStore {
    shared: Arc<Shared>,
}

impl CatalogStore {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::with_options(source, IdMatch::default(), IdGenerator::new())
    }

    pub fn with_options(
        source: Arc<dyn CatalogSource>,
        id_match: IdMatch,
        ids: IdGenerator,
    ) -> Self {
        ensure_metrics_described();
        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner {
                    products: Vec::new(),
                    ids,
                    status: StoreStatus::Idle,
                    last_outcome: None,
                }),
                source,
                id_match,
                hydrate_gate: tokio::sync::Mutex::new(()),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.shared.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.shared.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.shared.source
    }

    pub fn id_match(&self) -> IdMatch {
        self.shared.id_match
    }

    /// Resolve a raw or typed id under this store's policy.
    pub fn resolve_id<Q: IdQuery + ?Sized>(&self, id: &Q) -> Option<ProductId> {
        id.resolve(self.shared.id_match)
    }

    /* ----------------------------
    Hydrate
    ---------------------------- */

    /// Seed the collection from the source if it is empty.
    ///
    /// Non-empty collection: no-op. Concurrent callers coalesce: the first one
    /// fetches, the rest wait and receive the same outcome. On failure the
    /// collection is left as it was and the status becomes `Failed`.
    pub async fn hydrate(&self) -> Result<Hydration, CatalogError> {
        if !self.is_empty() {
            return Ok(Hydration::AlreadyPopulated);
        }

        let seen = self.shared.attempts.load(Ordering::Acquire);
        let _gate = self.shared.hydrate_gate.lock().await;

        if self.shared.attempts.load(Ordering::Acquire) != seen {
            // Another caller finished an attempt while we were waiting.
            let shared = self.read().last_outcome.clone();
            if let Some(outcome) = shared {
                return outcome.map(Hydration::Joined);
            }
        }
        if !self.is_empty() {
            return Ok(Hydration::AlreadyPopulated);
        }

        let source = self.shared.source.name();
        info!(source, "hydrating catalog");
        counter!("catalog_hydrate_total").increment(1);

        let mut loading = LoadingGuard::arm(self);
        let fetched = self.shared.source.fetch_all().await;
        loading.disarm();

        let outcome = {
            let mut inner = self.write();
            let outcome = match fetched {
                Ok(products) => {
                    // Anything present now was created locally while the fetch was in flight.
                    let mut merged = std::mem::take(&mut inner.products);
                    let fetched_count = products.len();
                    for p in products {
                        if !merged.iter().any(|q| q.id == p.id) {
                            merged.push(p);
                        }
                    }
                    inner.products = merged;
                    inner.status = StoreStatus::Ready;
                    gauge!("catalog_products").set(inner.products.len() as f64);
                    info!(source, count = fetched_count, "catalog hydrated");
                    Ok(fetched_count)
                }
                Err(e) => {
                    inner.status = StoreStatus::Failed {
                        message: e.user_message().to_string(),
                    };
                    counter!("catalog_hydrate_errors_total").increment(1);
                    warn!(source, error = %e, "catalog hydrate failed");
                    Err(e)
                }
            };
            inner.last_outcome = Some(outcome.clone());
            outcome
        };
        self.shared.attempts.fetch_add(1, Ordering::AcqRel);

        outcome.map(Hydration::Fetched)
    }

    /// True while a hydrate fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.read().status == StoreStatus::Loading
    }

    pub fn status(&self) -> StoreStatus {
        self.read().status.clone()
    }

    /// Cause of the most recent hydrate attempt, if it failed.
    pub fn last_error(&self) -> Option<CatalogError> {
        match &self.read().last_outcome {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }

    /* ----------------------------
    Local CRUD
    ---------------------------- */

    /// Add a product with a fresh id and zero rating at the front of the collection.
    pub fn create(&self, draft: ProductDraft) -> Product {
        let mut inner = self.write();
        let Inner { products, ids, .. } = &mut *inner;
        let id = ids.next_id(|candidate| products.iter().any(|p| p.id == candidate));
        let product = Product::from_draft(id, draft);
        products.insert(0, product.clone());

        counter!("catalog_mutations_total", "op" => "create").increment(1);
        gauge!("catalog_products").set(products.len() as f64);
        debug!(%id, title = %product.title, "product created");
        product
    }

    /// Merge `patch` over the matching product. Unknown id: silent no-op (`None`).
    pub fn update<Q: IdQuery + ?Sized>(&self, id: &Q, patch: ProductPatch) -> Option<Product> {
        let id = self.resolve_id(id)?;
        let mut inner = self.write();
        let product = inner.products.iter_mut().find(|p| p.id == id)?;
        product.apply(patch);

        counter!("catalog_mutations_total", "op" => "update").increment(1);
        debug!(%id, "product updated");
        Some(product.clone())
    }

    /// Remove the matching product. Unknown id: no-op (`None`).
    pub fn delete<Q: IdQuery + ?Sized>(&self, id: &Q) -> Option<Product> {
        let id = self.resolve_id(id)?;
        let mut inner = self.write();
        let pos = inner.products.iter().position(|p| p.id == id)?;
        let removed = inner.products.remove(pos);

        counter!("catalog_mutations_total", "op" => "delete").increment(1);
        gauge!("catalog_products").set(inner.products.len() as f64);
        debug!(%id, "product deleted");
        Some(removed)
    }

    /// Local lookup only; never consults the source.
    pub fn lookup<Q: IdQuery + ?Sized>(&self, id: &Q) -> Option<Product> {
        let id = self.resolve_id(id)?;
        self.read().products.iter().find(|p| p.id == id).cloned()
    }

    /// Snapshot of the collection in display order (newest local first).
    pub fn products(&self) -> Vec<Product> {
        self.read().products.clone()
    }

    pub fn len(&self) -> usize {
        self.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().products.is_empty()
    }
}

/// Holds the `Loading` status for the duration of a fetch. If the hydrate
/// future is dropped mid-fetch the status falls back to what it was.
struct LoadingGuard<'a> {
    store: &'a CatalogStore,
    previous: Option<StoreStatus>,
}

impl<'a> LoadingGuard<'a> {
    fn arm(store: &'a CatalogStore) -> Self {
        let previous = {
            let mut inner = store.write();
            std::mem::replace(&mut inner.status, StoreStatus::Loading)
        };
        Self {
            store,
            previous: Some(previous),
        }
    }

    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(prev) = self.previous.take() {
            let mut inner = self.store.write();
            if inner.status == StoreStatus::Loading {
                inner.status = prev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Category, Rating};
    use crate::source::FixtureSource;

    fn shirt() -> Product {
        Product {
            id: ProductId(1),
            title: "Shirt".into(),
            price: 9.99,
            description: "Cotton".into(),
            image: "http://x/s.png".into(),
            category: Category::MensClothing,
            rating: Rating { rate: 4.0, count: 10 },
        }
    }

    fn mug() -> ProductDraft {
        ProductDraft {
            title: "Mug".into(),
            price: 5.0,
            description: "D".into(),
            image: "http://x/i.png".into(),
            category: Category::Electronics,
        }
    }

    fn store_with(products: Vec<Product>) -> CatalogStore {
        CatalogStore::new(Arc::new(FixtureSource::from_products(products)))
    }

    #[tokio::test]
    async fn hydrate_seeds_exact_record() {
        let store = store_with(vec![shirt()]);
        assert_eq!(store.status(), StoreStatus::Idle);
        let h = store.hydrate().await.unwrap();
        assert_eq!(h, Hydration::Fetched(1));
        assert_eq!(store.products(), vec![shirt()]);
        assert_eq!(store.status(), StoreStatus::Ready);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn second_hydrate_is_noop() {
        let store = store_with(vec![shirt()]);
        store.hydrate().await.unwrap();
        assert_eq!(store.hydrate().await.unwrap(), Hydration::AlreadyPopulated);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_prepends_with_zero_rating() {
        let store = store_with(vec![]);
        let a = store.create(mug());
        let b = store.create(mug());
        assert_ne!(a.id, b.id);
        assert_eq!(a.rating, Rating::ZERO);
        assert_eq!(store.products()[0].id, b.id);
        assert_eq!(store.lookup(&a.id), Some(a));
    }

    #[test]
    fn update_by_string_id_changes_only_price() {
        let store = store_with(vec![]);
        let created = store.create(mug());
        let raw = created.id.to_string();
        let updated = store.update(raw.as_str(), ProductPatch::price(12.5)).unwrap();
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.rating, created.rating);
    }

    #[test]
    fn unknown_ids_are_noops() {
        let store = store_with(vec![]);
        store.create(mug());
        let before = store.products();
        assert!(store.update("424242", ProductPatch::price(1.0)).is_none());
        assert!(store.delete("424242").is_none());
        assert!(store.lookup("not-a-number").is_none());
        assert_eq!(store.products(), before);
    }

    #[test]
    fn delete_then_lookup_is_absent() {
        let store = store_with(vec![]);
        let p = store.create(mug());
        assert_eq!(store.delete(&p.id).map(|d| d.id), Some(p.id));
        assert!(store.lookup(&p.id).is_none());
        assert!(store.is_empty());
    }
}
