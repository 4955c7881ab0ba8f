//! Sled Persistence

mod portrait_cache;

pub use portrait_cache::{SledPortraitCache, SledPortraitCacheConfig};
