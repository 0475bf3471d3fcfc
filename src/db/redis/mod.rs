//! Redis-backed caching of catalog responses.
//!
//! Reads go straight to Redis and treat any failure as a miss. Writes are
//! queued to a background task so a slow or absent Redis never delays a
//! request.

pub mod cache;

mod macros;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
