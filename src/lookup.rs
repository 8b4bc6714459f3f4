//! Local-first lookup with a remote fallback, for direct navigation to a
//! product that is not (yet) in the store.

use metrics::counter;
use serde::Serialize;

use crate::error::CatalogError;
use crate::id::IdQuery;
use crate::product::Product;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located {
    pub origin: Origin,
    pub product: Product,
}

/// Store first, then `GET /products/{id}`. The remote copy is returned but not
/// inserted; local state only changes through store operations.
///
/// Ids that do not coerce under the store's policy are "not found" without a request.
pub async fn find_or_fetch<Q: IdQuery + ?Sized>(
    store: &CatalogStore,
    id: &Q,
) -> Result<Option<Located>, CatalogError> {
    let Some(pid) = store.resolve_id(id) else {
        return Ok(None);
    };
    if let Some(product) = store.lookup(&pid) {
        return Ok(Some(Located {
            origin: Origin::Local,
            product,
        }));
    }

    counter!("catalog_remote_lookups_total").increment(1);
    let remote = store.source().fetch_one(pid).await?;
    tracing::debug!(id = %pid, found = remote.is_some(), "remote lookup fallback");
    Ok(remote.map(|product| Located {
        origin: Origin::Remote,
        product,
    }))
}
