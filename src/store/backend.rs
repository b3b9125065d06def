//! Fast store abstraction
//!
//! Provides a trait for key-value cache operations that can be implemented
//! by different backends (Redis over TCP, in-process map).

use crate::error::HitrateResult;
use async_trait::async_trait;

/// Abstract fast store interface
///
/// Implementations report every failure as an error and never retry on
/// their own; retry and degradation policy live in
/// [`ResilientStoreHandle`](super::ResilientStoreHandle).
#[async_trait]
pub trait FastStore: Send + Sync {
    /// Liveness probe: succeeds only if the store answered a round trip
    async fn ping(&self) -> HitrateResult<()>;

    /// Fetch the raw value for a key, `None` when absent or expired
    async fn get(&self, key: &str) -> HitrateResult<Option<Vec<u8>>>;

    /// Write a value that expires after `ttl_secs`, replacing any existing value
    async fn set_ex(&self, key: &str, value: &[u8], ttl_secs: u64) -> HitrateResult<()>;

    /// Write a value with no expiry, replacing any existing value
    async fn set(&self, key: &str, value: &[u8]) -> HitrateResult<()>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;

    /// Address or description of where the store lives
    fn address(&self) -> String;
}
