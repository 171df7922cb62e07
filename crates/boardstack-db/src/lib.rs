//! BoardStack data layer.
//!
//! Row types plus the [`BoardStore`] seam, with an in-memory backend for
//! development and tests and a Redis backend for deployments.

pub mod error;
pub mod memory;
pub mod redis_store;
pub mod rows;
pub mod store;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use rows::*;
pub use store::{BoardStore, DbPool};

/// Open a store: Redis when a URL is given, otherwise in-memory.
pub async fn init_pool(redis_url: Option<&str>) -> DbResult<DbPool> {
    match redis_url {
        Some(url) => Ok(Arc::new(RedisStore::connect(url).await?)),
        None => {
            tracing::warn!("No REDIS_URL configured, using in-memory store (data is not persisted)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
