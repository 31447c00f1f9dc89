pub mod lru;
pub mod store;

pub use lru::RecencyCache;
pub use store::{CacheEntry, DOCUMENT_CACHE_CAPACITY, DocumentStore};
