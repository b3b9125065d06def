//! Store factory for creating the configured fast store backend

use crate::config::schema::{StoreBackend, StoreConfig};
use crate::error::HitrateResult;
use crate::store::backend::FastStore;
use crate::store::handle::{ResilientStoreHandle, RetryPolicy};
use crate::store::memory::MemoryStore;
use crate::store::redis_store::RedisStore;
use std::sync::Arc;

/// Create the fast store selected by configuration
///
/// # Returns
/// * `Ok(Arc<dyn FastStore>)` - The backend, not yet connected
/// * `Err` - If the Redis URL cannot be parsed
pub fn create_store(config: &StoreConfig) -> HitrateResult<Arc<dyn FastStore>> {
    match config.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisStore::open(config)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Create a (disconnected) resilient handle over the configured backend
pub fn create_handle(config: &StoreConfig) -> HitrateResult<ResilientStoreHandle> {
    let store = create_store(config)?;
    Ok(ResilientStoreHandle::new(
        store,
        RetryPolicy::from_config(config),
    ))
}
