//! In-process fast store with per-key expiry
//!
//! Used for offline experiments (`--store memory`) and as the fake store in
//! tests, with switches for injecting connection and I/O failures.

use crate::error::{HitrateError, HitrateResult};
use crate::store::backend::FastStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Stored value with optional expiry deadline
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process key-value store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    failing_probes: AtomicU32,
    failing_io: AtomicBool,
    pub probe_calls: AtomicU64,
    pub get_calls: AtomicU64,
    pub set_calls: AtomicU64,
}

impl MemoryStore {
    /// Create an empty, healthy store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` liveness probes
    pub fn with_failing_probes(self, n: u32) -> Self {
        self.failing_probes.store(n, Ordering::SeqCst);
        self
    }

    /// Make every get/set call fail until switched off
    pub fn set_failing_io(&self, failing: bool) {
        self.failing_io.store(failing, Ordering::SeqCst);
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Whether the store holds no live entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_io(&self, op: &str) -> HitrateResult<()> {
        if self.failing_io.load(Ordering::SeqCst) {
            return Err(HitrateError::store(format!("{} failed: injected I/O fault", op)));
        }
        Ok(())
    }

    async fn insert(&self, key: &str, value: &[u8], expires_at: Option<Instant>) {
        self.entries.lock().await.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
    }
}

#[async_trait]
impl FastStore for MemoryStore {
    async fn ping(&self) -> HitrateResult<()> {
        self.probe_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.failing_probes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_probes.store(remaining - 1, Ordering::SeqCst);
            return Err(HitrateError::StoreProbe("injected connection refusal".to_string()));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> HitrateResult<Option<Vec<u8>>> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.check_io("GET")?;

        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl_secs: u64) -> HitrateResult<()> {
        self.set_calls.fetch_add(1, Ordering::Relaxed);
        self.check_io("SETEX")?;
        let expires_at = Instant::now().checked_add(Duration::from_secs(ttl_secs));
        self.insert(key, value, expires_at).await;
        Ok(())
    }

    async fn set(&self, key: &str, value: &[u8]) -> HitrateResult<()> {
        self.set_calls.fetch_add(1, Ordering::Relaxed);
        self.check_io("SET")?;
        self.insert(key, value, None).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn address(&self) -> String {
        "in-process".to_string()
    }
}
