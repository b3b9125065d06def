//! Cache accessor: fast store first, source of record on miss
//!
//! Every lookup is classified as exactly one of hit, miss or degraded, and
//! counted. Fast-store faults stop here: lookups turn them into a degraded
//! outcome and writes log and drop them.

use crate::store::{ConnectionState, ResilientStoreHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Summary returned by [`CacheAccessor::metrics_summary`] before any lookup
pub const NO_DATA: &str = "no data";

/// Key prefix for batch analytics reports
pub const ANALYTICS_PREFIX: &str = "analytics:";

/// Opaque payload cached under a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheRecord(serde_json::Value);

impl CacheRecord {
    /// Wrap a JSON value
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the JSON payload
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Serialize for the fast store
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a serde_json::Value cannot fail
        serde_json::to_vec(&self.0).unwrap_or_default()
    }

    /// Decode a stored blob; text that is not JSON is kept as a JSON string
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self(value),
            Err(_) => Self(serde_json::Value::String(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
        }
    }
}

/// Where a lookup was (or must be) served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    /// Served by the fast store
    Cache,
    /// Absent from the fast store; the source of record must serve it
    Db,
    /// Fast store unreachable or failing; the source of record must serve it
    DbDegraded,
}

impl Source {
    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "CACHE",
            Self::Db => "DB",
            Self::DbDegraded => "DB_DEGRADED",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(CacheRecord),
    Miss,
    Degraded,
}

impl Lookup {
    pub fn source(&self) -> Source {
        match self {
            Self::Hit(_) => Source::Cache,
            Self::Miss => Source::Db,
            Self::Degraded => Source::DbDegraded,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// A classified lookup with its fast-store latency
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub outcome: Lookup,
    pub latency_ms: f64,
}

impl LookupResult {
    pub fn source(&self) -> Source {
        self.outcome.source()
    }

    /// The cached record, when this was a hit
    pub fn record(&self) -> Option<&CacheRecord> {
        match &self.outcome {
            Lookup::Hit(record) => Some(record),
            _ => None,
        }
    }
}

/// Cumulative lookup counters for one accessor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub total_latency_ms: f64,
}

impl Stats {
    /// Lookups counted so far
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate in percent, `None` before the first lookup
    pub fn hit_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.hits as f64 / total as f64 * 100.0),
        }
    }

    /// Mean fast-store latency per lookup
    pub fn mean_latency_ms(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.total_latency_ms / total as f64),
        }
    }
}

/// Cache-aside accessor over a resilient fast-store handle
pub struct CacheAccessor {
    handle: Arc<ResilientStoreHandle>,
    stats: Stats,
}

impl CacheAccessor {
    /// Create an accessor with zeroed counters
    pub fn new(handle: Arc<ResilientStoreHandle>) -> Self {
        Self {
            handle,
            stats: Stats::default(),
        }
    }

    /// Shared handle to the fast store
    pub fn handle(&self) -> &Arc<ResilientStoreHandle> {
        &self.handle
    }

    /// Current counters (read, never reset)
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Look a key up in the fast store and classify the outcome.
    ///
    /// Latency covers only the fast-store call. A disconnected handle
    /// short-circuits to a degraded miss without touching the store.
    pub async fn lookup(&mut self, key: &str) -> LookupResult {
        let started = Instant::now();

        let outcome = if self.handle.state() == ConnectionState::Disconnected {
            Lookup::Degraded
        } else {
            match self.handle.get(key).await {
                Ok(Some(bytes)) => Lookup::Hit(CacheRecord::decode(&bytes)),
                Ok(None) => Lookup::Miss,
                Err(e) => {
                    warn!("Cache lookup for {} failed, treating as miss: {}", key, e);
                    Lookup::Degraded
                }
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Lookup::Hit(_) => self.stats.hits += 1,
            Lookup::Miss | Lookup::Degraded => self.stats.misses += 1,
        }
        self.stats.total_latency_ms += latency_ms;

        LookupResult {
            outcome,
            latency_ms,
        }
    }

    /// Best-effort write with expiry; failures are logged and dropped
    pub async fn store(&self, key: &str, record: &CacheRecord, ttl_secs: u64) {
        if !self.handle.is_available() {
            debug!("Skipping cache write for {}: fast store disconnected", key);
            return;
        }

        if let Err(e) = self.handle.set_ex(key, &record.encode(), ttl_secs).await {
            warn!("Cache write for {} dropped: {}", key, e);
        }
    }

    /// Store an analytics report (rows of fields) with no expiry.
    ///
    /// Returns whether the report reached the fast store.
    pub async fn store_report(&self, name: &str, rows: &[Vec<String>]) -> bool {
        if !self.handle.is_available() {
            warn!("Skipping report {}: fast store disconnected", name);
            return false;
        }

        let payload = match serde_json::to_vec(rows) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize report {}: {}", name, e);
                return false;
            }
        };

        match self.handle.set(&report_key(name), &payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Report {} dropped: {}", name, e);
                false
            }
        }
    }

    /// Fetch an analytics report; not counted in lookup stats
    pub async fn fetch_report(&self, name: &str) -> Option<Vec<Vec<String>>> {
        if !self.handle.is_available() {
            return None;
        }

        match self.handle.get(&report_key(name)).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(rows) => Some(rows),
                Err(e) => {
                    warn!("Report {} is not a row list: {}", name, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Report {} fetch failed: {}", name, e);
                None
            }
        }
    }

    /// Human-readable hit/miss snapshot, or [`NO_DATA`] before any lookup
    pub fn metrics_summary(&self) -> String {
        match self.stats.hit_rate() {
            None => NO_DATA.to_string(),
            Some(rate) => format!(
                "Hits: {} | Misses: {} | Hit Rate: {:.1}%",
                self.stats.hits, self.stats.misses, rate
            ),
        }
    }
}

fn report_key(name: &str) -> String {
    format!("{}{}", ANALYTICS_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RetryPolicy};
    use serde_json::json;

    async fn connected(store: Arc<MemoryStore>) -> CacheAccessor {
        let handle = ResilientStoreHandle::new(store, RetryPolicy::default());
        handle.connect().await;
        CacheAccessor::new(Arc::new(handle))
    }

    fn disconnected(store: Arc<MemoryStore>) -> CacheAccessor {
        let handle = ResilientStoreHandle::new(store, RetryPolicy::default());
        CacheAccessor::new(Arc::new(handle))
    }

    #[tokio::test]
    async fn miss_then_hit_after_store() {
        let mut accessor = connected(Arc::new(MemoryStore::new())).await;
        let record = CacheRecord::new(json!({"uuid": "abc", "lat": -33.4, "lon": -70.6}));

        let first = accessor.lookup("abc").await;
        assert_eq!(first.source(), Source::Db);

        accessor.store("abc", &record, 60).await;
        let second = accessor.lookup("abc").await;
        assert_eq!(second.source(), Source::Cache);
        assert_eq!(second.record(), Some(&record));

        let stats = accessor.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!(stats.total_latency_ms >= 0.0);
    }

    #[tokio::test]
    async fn disconnected_short_circuits() {
        let store = Arc::new(MemoryStore::new());
        let mut accessor = disconnected(store.clone());

        for _ in 0..5 {
            let result = accessor.lookup("abc").await;
            assert_eq!(result.source(), Source::DbDegraded);
            assert!(result.latency_ms < 50.0);
        }

        let stats = accessor.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.total(), 5);
        assert_eq!(store.get_calls.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn io_error_counts_as_degraded_miss() {
        let store = Arc::new(MemoryStore::new());
        let mut accessor = connected(store.clone()).await;
        accessor
            .store("abc", &CacheRecord::new(json!(1)), 60)
            .await;

        store.set_failing_io(true);
        let result = accessor.lookup("abc").await;
        assert_eq!(result.source(), Source::DbDegraded);
        assert_eq!(accessor.stats().misses, 1);
        assert_eq!(accessor.stats().hits, 0);

        store.set_failing_io(false);
        assert_eq!(accessor.lookup("abc").await.source(), Source::Cache);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let accessor = connected(store.clone()).await;
        store.set_failing_io(true);

        accessor.store("abc", &CacheRecord::new(json!({})), 60).await;
        store.set_failing_io(false);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn hits_plus_misses_equals_lookups() {
        let store = Arc::new(MemoryStore::new());
        let mut accessor = connected(store.clone()).await;
        let keys = ["a", "b", "a", "c", "a", "b", "d", "a"];

        for (i, key) in keys.iter().enumerate() {
            if i == 4 {
                store.set_failing_io(true);
            }
            if i == 5 {
                store.set_failing_io(false);
            }
            let result = accessor.lookup(key).await;
            if !result.outcome.is_hit() {
                accessor.store(key, &CacheRecord::new(json!(key)), 60).await;
            }
        }

        assert_eq!(accessor.stats().total(), keys.len() as u64);
    }

    #[tokio::test]
    async fn metrics_summary_no_data_then_rate() {
        let mut accessor = connected(Arc::new(MemoryStore::new())).await;
        assert_eq!(accessor.metrics_summary(), NO_DATA);

        accessor.store("k", &CacheRecord::new(json!(1)), 60).await;
        accessor.lookup("k").await;
        accessor.lookup("k").await;
        accessor.lookup("k").await;
        accessor.lookup("other").await;

        assert_eq!(
            accessor.metrics_summary(),
            "Hits: 3 | Misses: 1 | Hit Rate: 75.0%"
        );
        assert_eq!(accessor.stats().hit_rate(), Some(75.0));
    }

    #[tokio::test]
    async fn reports_roundtrip_without_touching_stats() {
        let accessor = connected(Arc::new(MemoryStore::new())).await;
        let rows = vec![
            vec!["JAM".to_string(), "120".to_string()],
            vec!["ACCIDENT".to_string(), "14".to_string()],
        ];

        assert!(accessor.store_report("by_type", &rows).await);
        assert_eq!(accessor.fetch_report("by_type").await, Some(rows));
        assert_eq!(accessor.fetch_report("missing").await, None);
        assert_eq!(accessor.stats().total(), 0);
    }

    #[test]
    fn decode_keeps_non_json_text() {
        let record = CacheRecord::decode(b"plain text");
        assert_eq!(record.as_value(), &json!("plain text"));

        let record = CacheRecord::decode(br#"{"a":1}"#);
        assert_eq!(record.as_value(), &json!({"a": 1}));
    }

    #[test]
    fn source_labels() {
        assert_eq!(Source::Cache.to_string(), "CACHE");
        assert_eq!(Source::Db.to_string(), "DB");
        assert_eq!(Source::DbDegraded.to_string(), "DB_DEGRADED");
    }
}
