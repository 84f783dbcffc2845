//! Time-boxed caching of metadata graphs.
//!
//! - [`CacheStore`] - backend contract, with the in-process [`MemoryCacheStore`]
//! - [`MetadataCache`] - the builder wrapped with one entry per access scope

mod metadata;
mod store;

pub use metadata::MetadataCache;
pub use store::{CacheStore, CacheStoreError, MemoryCacheStore};
