//! ctn-catalog
//!
//! Read-mostly snapshots the selling surfaces depend on: the purchasable
//! catalog and the per-student restriction set. Both are replaced wholesale
//! from the backend, never patched in place, and both fail *closed*: a
//! failed catalog refresh keeps the previous snapshot, a failed restriction
//! load degrades to "unverified" rather than "unrestricted".

mod cache;
mod restrictions;

pub use cache::{CatalogCache, CatalogQuery};
pub use restrictions::{RestrictionLoadError, RestrictionSet};
