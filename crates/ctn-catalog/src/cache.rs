//! In-memory snapshot of the purchasable catalog.
//!
//! # Consistency model
//!
//! The cache is a read-mostly snapshot, replaced wholesale by
//! [`CatalogCache::refresh`] and never patched in place by the server side.
//! The single local mutation is [`CatalogCache::reserve_stock`], the cart's
//! optimistic stock reservation; removed cart lines do *not* restore stock.
//! Both divergences are reconciled by the next refresh — the cache is
//! documented eventually-consistent, not authoritative.
//!
//! A failed refresh preserves the previous snapshot intact (no partial
//! overwrite): a POS screen keeps selling from slightly stale data rather
//! than from nothing.

use std::collections::BTreeMap;

use ctn_backend::{Backend, BackendResult, CatalogFilter};
use ctn_schemas::{CatalogItem, Money};
use tracing::{info, warn};

/// Local, client-side catalog query (the parent portal's filter bar).
/// Server-side name/category filtering exists too ([`CatalogFilter`]); this
/// one operates on the cached snapshot without a round trip.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Case-insensitive substring match on the item name.
    pub name_contains: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

/// Snapshot cache of [`CatalogItem`]s keyed by id.
#[derive(Debug, Default)]
pub struct CatalogCache {
    items: BTreeMap<i64, CatalogItem>,
    refresh_count: u64,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full catalog and replace the snapshot wholesale.
    ///
    /// Returns the number of items in the new snapshot.
    ///
    /// # Errors
    /// Any fetch or schema failure is returned unchanged and the previous
    /// snapshot is left untouched.
    pub async fn refresh(&mut self, backend: &dyn Backend) -> BackendResult<usize> {
        let fetched = match backend.fetch_catalog(&CatalogFilter::default()).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "catalog refresh failed; keeping previous snapshot");
                return Err(e);
            }
        };

        self.items = fetched.into_iter().map(|item| (item.id, item)).collect();
        self.refresh_count += 1;
        info!(
            items = self.items.len(),
            refresh = self.refresh_count,
            "catalog snapshot replaced"
        );
        Ok(self.items.len())
    }

    pub fn find_by_id(&self, id: i64) -> Option<&CatalogItem> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct categories, sorted (the filter dropdown's source).
    pub fn categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self.items.values().map(|i| i.category.as_str()).collect();
        cats.sort_unstable();
        cats.dedup();
        cats
    }

    /// Filter the cached snapshot.
    pub fn query(&self, q: &CatalogQuery) -> Vec<&CatalogItem> {
        let needle = q.name_contains.as_ref().map(|s| s.to_lowercase());
        self.items
            .values()
            .filter(|item| {
                if let Some(ref n) = needle {
                    if !item.name.to_lowercase().contains(n.as_str()) {
                        return false;
                    }
                }
                if let Some(ref cat) = q.category {
                    if &item.category != cat {
                        return false;
                    }
                }
                if let Some(min) = q.min_price {
                    if item.price < min {
                        return false;
                    }
                }
                if let Some(max) = q.max_price {
                    if item.price > max {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Optimistically reserve `qty` units of local stock.
    ///
    /// Returns `false` (and changes nothing) if the item is unknown or the
    /// cached stock is insufficient. The reservation is local-only and is
    /// overwritten by the next [`refresh`](Self::refresh).
    pub fn reserve_stock(&mut self, item_id: i64, qty: u32) -> bool {
        match self.items.get_mut(&item_id) {
            Some(item) if item.stock >= qty => {
                item.stock -= qty;
                true
            }
            _ => false,
        }
    }

    /// Test/seed constructor: build a snapshot directly.
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id, i)).collect(),
            refresh_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
