//! Resilient connection handle for the fast store

use crate::config::schema::StoreConfig;
use crate::error::{HitrateError, HitrateResult};
use crate::store::backend::FastStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Connection state as seen by callers of the handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or every connection attempt failed
    Disconnected,
    /// Liveness probe succeeded and the last call did too
    Connected,
    /// Connected, but the most recent call failed with this cause
    Degraded(String),
}

impl ConnectionState {
    /// Whether calls should be sent to the store at all
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Degraded(_) => "degraded",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded(cause) => write!(f, "degraded ({})", cause),
            other => f.write_str(other.label()),
        }
    }
}

/// Bounded retry policy for establishing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts (at least one is always made)
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Build the policy from store configuration
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            max_attempts: config.connect_attempts,
            backoff: config.connect_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Source of backoff waits, swappable so tests skip real delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fast store handle with bounded connect retry and degraded-mode tracking
///
/// Only [`connect`](Self::connect) and [`reconnect`](Self::reconnect) retry.
/// A failing get/set marks the handle `Degraded` and returns the error; the
/// next call still goes to the store, and a success restores `Connected`.
pub struct ResilientStoreHandle {
    store: Arc<dyn FastStore>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    state: RwLock<ConnectionState>,
}

impl ResilientStoreHandle {
    /// Create a disconnected handle that sleeps on the tokio timer
    pub fn new(store: Arc<dyn FastStore>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(store, policy, Arc::new(TokioSleeper))
    }

    /// Create a disconnected handle with a custom sleeper
    pub fn with_sleeper(
        store: Arc<dyn FastStore>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            policy,
            sleeper,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Establish the connection, retrying per policy.
    ///
    /// Never fails: when every attempt is exhausted the handle is left
    /// `Disconnected` and callers run in degraded mode.
    pub async fn connect(&self) -> ConnectionState {
        let attempts = self.policy.max_attempts.max(1);
        let address = self.store.address();

        for attempt in 1..=attempts {
            match self.store.ping().await {
                Ok(()) => {
                    info!(
                        "Connected to {} fast store at {}",
                        self.store.backend_name(),
                        address
                    );
                    self.set_state(ConnectionState::Connected);
                    return ConnectionState::Connected;
                }
                Err(e) => {
                    warn!(
                        "Fast store at {} not ready (attempt {}/{}): {}",
                        address, attempt, attempts, e
                    );
                    if attempt < attempts {
                        self.sleeper.sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        error!(
            "Giving up on fast store at {} after {} attempts, continuing in degraded mode",
            address, attempts
        );
        self.set_state(ConnectionState::Disconnected);
        ConnectionState::Disconnected
    }

    /// Explicit reconnect request; runs the same bounded loop as `connect`
    pub async fn reconnect(&self) -> ConnectionState {
        debug!("Reconnect requested");
        self.connect().await
    }

    /// Current connection state (never blocks on I/O)
    pub fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Whether calls should be attempted at all
    pub fn is_available(&self) -> bool {
        self.state().is_usable()
    }

    /// Backend name of the underlying store
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Address of the underlying store
    pub fn address(&self) -> String {
        self.store.address()
    }

    /// Single GET; failures mark the handle degraded
    pub async fn get(&self, key: &str) -> HitrateResult<Option<Vec<u8>>> {
        let result = self.store.get(key).await;
        self.observe(&result);
        result
    }

    /// Single SETEX; failures mark the handle degraded
    pub async fn set_ex(&self, key: &str, value: &[u8], ttl_secs: u64) -> HitrateResult<()> {
        let result = self.store.set_ex(key, value, ttl_secs).await;
        self.observe(&result);
        result
    }

    /// Single SET without expiry; failures mark the handle degraded
    pub async fn set(&self, key: &str, value: &[u8]) -> HitrateResult<()> {
        let result = self.store.set(key, value).await;
        self.observe(&result);
        result
    }

    /// Round-trip probe on an established handle, without retry
    pub async fn probe(&self) -> HitrateResult<Duration> {
        if !self.is_available() {
            return Err(HitrateError::StoreProbe("handle is disconnected".to_string()));
        }
        let started = std::time::Instant::now();
        let result = self.store.ping().await;
        self.observe(&result);
        result.map(|()| started.elapsed())
    }

    fn observe<T>(&self, result: &HitrateResult<T>) {
        match result {
            Ok(_) => {
                if matches!(self.state(), ConnectionState::Degraded(_)) {
                    debug!("Fast store call succeeded, leaving degraded state");
                    self.set_state(ConnectionState::Connected);
                }
            }
            Err(e) => {
                if self.is_available() {
                    self.set_state(ConnectionState::Degraded(e.to_string()));
                }
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
