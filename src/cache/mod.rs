//! File-based caches for merged configuration.

mod blob;
mod error;
mod record;

pub use blob::{hash_key, FileCache};
pub use error::CacheError;
pub use record::ConfigCache;
