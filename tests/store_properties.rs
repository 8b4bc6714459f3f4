// tests/store_properties.rs
//
// Behavioural checks for the catalog store's local operations:
// create/lookup, partial update, delete, no-ops on unknown ids, id policy.

mod common;

use std::sync::Arc;

use rand::Rng;

use catalog_store::id::IdGenerator;
use catalog_store::{
    CatalogStore, Category, FixtureSource, Hydration, IdMatch, Product, ProductId, ProductPatch,
    Rating,
};

fn empty_store() -> CatalogStore {
    CatalogStore::new(Arc::new(FixtureSource::default()))
}

async fn seeded_store() -> CatalogStore {
    let store = CatalogStore::new(Arc::new(FixtureSource::from_products(common::sample())));
    store.hydrate().await.expect("fixture hydrate");
    store
}

#[tokio::test]
async fn hydrate_single_record_yields_exactly_that_record() {
    let shirt = Product {
        id: ProductId(1),
        title: "Shirt".into(),
        price: 9.99,
        description: "Plain tee".into(),
        image: "http://x/shirt.png".into(),
        category: Category::MensClothing,
        rating: Rating { rate: 4.2, count: 17 },
    };
    let store = CatalogStore::new(Arc::new(FixtureSource::from_products(vec![shirt.clone()])));

    assert_eq!(store.hydrate().await.unwrap(), Hydration::Fetched(1));
    assert_eq!(store.products(), vec![shirt]);
}

#[tokio::test]
async fn hydrate_twice_never_duplicates() {
    let store = seeded_store().await;
    let n = store.len();
    assert_eq!(store.hydrate().await.unwrap(), Hydration::AlreadyPopulated);
    assert_eq!(store.hydrate().await.unwrap(), Hydration::AlreadyPopulated);
    assert_eq!(store.len(), n);
}

#[tokio::test]
async fn create_mug_scenario() {
    let store = seeded_store().await;
    let before = store.len();

    let created = store.create(common::mug());
    assert_eq!(created.title, "Mug");
    assert_eq!(created.price, 5.0);
    assert_eq!(created.description, "D");
    assert_eq!(created.image, "http://x/i.png");
    assert_eq!(created.category, Category::Electronics);
    assert_eq!(created.rating, Rating { rate: 0.0, count: 0 });
    assert!(common::sample().iter().all(|p| p.id != created.id));

    assert_eq!(store.len(), before + 1);
    assert_eq!(store.products()[0], created);
    assert_eq!(store.lookup(&created.id), Some(created));
}

#[test]
fn create_then_lookup_returns_created_product() {
    let store = empty_store();
    for _ in 0..50 {
        let created = store.create(common::mug());
        let found = store.lookup(&created.id).expect("just created");
        assert_eq!(found, created);
        assert_eq!(found.rating, Rating::ZERO);
    }
    // 50 creations in a tight loop: all ids distinct.
    let mut ids: Vec<_> = store.products().iter().map(|p| p.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[tokio::test]
async fn update_string_id_changes_only_price() {
    let store = seeded_store().await;
    let original = store.lookup(&ProductId(1)).unwrap();
    let others: Vec<_> = store
        .products()
        .into_iter()
        .filter(|p| p.id != ProductId(1))
        .collect();

    let updated = store.update("1", ProductPatch::price(12.5)).unwrap();

    assert_eq!(updated.price, 12.5);
    assert_eq!(
        updated,
        Product {
            price: 12.5,
            ..original
        }
    );
    let others_after: Vec<_> = store
        .products()
        .into_iter()
        .filter(|p| p.id != ProductId(1))
        .collect();
    assert_eq!(others, others_after);
}

#[tokio::test]
async fn random_patches_change_only_patched_fields() {
    let store = seeded_store().await;
    let mut rng = rand::rng();

    for round in 0..200 {
        let ids: Vec<_> = store.products().iter().map(|p| p.id).collect();
        let id = ids[rng.random_range(0..ids.len())];
        let before = store.lookup(&id).unwrap();

        let patch = ProductPatch {
            title: rng.random_bool(0.5).then(|| format!("title-{round}")),
            price: rng.random_bool(0.5).then(|| rng.random_range(1..10_000) as f64 / 100.0),
            description: rng.random_bool(0.5).then(|| format!("desc-{round}")),
            image: rng.random_bool(0.5).then(|| format!("http://img/{round}.png")),
            category: rng
                .random_bool(0.5)
                .then(|| Category::SELECTABLE[rng.random_range(0..4)].clone()),
        };

        let after = store.update(&id, patch.clone()).unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.rating, before.rating);
        assert_eq!(after.title, patch.title.unwrap_or(before.title));
        assert_eq!(after.price, patch.price.unwrap_or(before.price));
        assert_eq!(after.description, patch.description.unwrap_or(before.description));
        assert_eq!(after.image, patch.image.unwrap_or(before.image));
        assert_eq!(after.category, patch.category.unwrap_or(before.category));
    }
}

#[tokio::test]
async fn unknown_id_leaves_collection_unchanged() {
    let store = seeded_store().await;
    let before = store.products();

    assert!(store.update("999", ProductPatch::price(1.0)).is_none());
    assert!(store.delete("999").is_none());
    assert!(store.lookup("999").is_none());
    assert!(store.update(&ProductId(12345), ProductPatch::default()).is_none());

    assert_eq!(store.products(), before);
}

#[tokio::test]
async fn delete_then_lookup_is_absent() {
    let store = seeded_store().await;
    let created = store.create(common::mug());

    for id in [ProductId(1), ProductId(9), created.id] {
        assert!(store.delete(&id).is_some());
        assert!(store.lookup(&id).is_none());
        assert!(store.delete(&id).is_none());
    }
    assert_eq!(store.len(), common::sample().len() - 2);
}

#[tokio::test]
async fn lenient_policy_matches_numeric_prefix() {
    let store = seeded_store().await;
    assert_eq!(store.lookup("5abc").map(|p| p.id), Some(ProductId(5)));
    assert_eq!(store.lookup(" 9").map(|p| p.id), Some(ProductId(9)));
}

#[tokio::test]
async fn strict_policy_requires_exact_digits() {
    let store = CatalogStore::with_options(
        Arc::new(FixtureSource::from_products(common::sample())),
        IdMatch::Strict,
        IdGenerator::new(),
    );
    store.hydrate().await.unwrap();

    assert!(store.lookup("5abc").is_none());
    assert!(store.delete("5abc").is_none());
    assert_eq!(store.lookup("5").map(|p| p.id), Some(ProductId(5)));
}

#[test]
fn ids_stay_unique_under_a_frozen_clock() {
    fn frozen() -> u64 {
        1
    }
    // Clock collides with remote-style ids; the generator must step over them.
    let store = CatalogStore::with_options(
        Arc::new(FixtureSource::default()),
        IdMatch::Lenient,
        IdGenerator::with_clock(frozen),
    );
    let a = store.create(common::mug());
    let b = store.create(common::mug());
    let c = store.create(common::mug());
    assert_eq!(
        [a.id, b.id, c.id],
        [ProductId(1), ProductId(2), ProductId(3)]
    );
}
