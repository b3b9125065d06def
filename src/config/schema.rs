//! Configuration schema for hitrate
//!
//! Configuration is stored at `~/.config/hitrate/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Environment variable naming the experiment run
pub const ENV_RUN_NAME: &str = "HITRATE_RUN_NAME";

/// Environment variable holding the run duration in (fractional) hours
pub const ENV_DURATION_HOURS: &str = "HITRATE_DURATION_HOURS";

/// Environment variable overriding the fast-store host
pub const ENV_STORE_HOST: &str = "HITRATE_STORE_HOST";

/// Fallback run duration when the configured value is unusable
pub const DEFAULT_DURATION_HOURS: f64 = 1.0;

/// Longest accepted run (one year)
pub const MAX_DURATION_HOURS: f64 = 24.0 * 365.0;

/// Longest accepted expiry for written entries (30 days)
pub const MAX_TTL_SECS: u64 = 30 * 24 * 3600;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Fast store (cache) settings
    pub store: StoreConfig,

    /// Synthetic workload settings
    pub workload: WorkloadConfig,

    /// Telemetry log settings
    pub telemetry: TelemetryConfig,

    /// Seed population settings
    pub seeds: SeedsConfig,
}

impl Config {
    /// Apply environment overrides on top of file values.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`; tests pass a closure
    /// over a map instead.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_RUN_NAME).filter(|v| !v.trim().is_empty()) {
            self.workload.run_name = name.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_DURATION_HOURS) {
            self.workload.duration_hours = parse_duration_hours(&raw);
        }

        if let Some(host) = lookup(ENV_STORE_HOST).filter(|v| !v.trim().is_empty()) {
            self.store.host = host.trim().to_string();
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }
}

/// True for a positive, finite run length no longer than [`MAX_DURATION_HOURS`]
pub fn duration_hours_in_range(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0 && hours <= MAX_DURATION_HOURS
}

/// Parse a duration in hours, falling back to the default on bad input
pub fn parse_duration_hours(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(hours) if duration_hours_in_range(hours) => hours,
        Ok(hours) => {
            warn!(
                "Duration {} hours is outside (0, {}], using {}",
                hours, MAX_DURATION_HOURS, DEFAULT_DURATION_HOURS
            );
            DEFAULT_DURATION_HOURS
        }
        Err(e) => {
            warn!(
                "Could not parse duration '{}' ({}), using {} hours",
                raw, e, DEFAULT_DURATION_HOURS
            );
            DEFAULT_DURATION_HOURS
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Fast store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis over TCP
    Redis,
    /// In-process map, for offline experiments
    Memory,
}

/// Fast store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use
    pub backend: StoreBackend,

    /// Host name of the fast store
    pub host: String,

    /// Port of the fast store
    pub port: u16,

    /// Expiry for written entries, in seconds
    pub ttl_secs: u64,

    /// Connection attempts before falling back to degraded mode
    pub connect_attempts: u32,

    /// Wait between connection attempts, in milliseconds
    pub connect_backoff_ms: u64,

    /// Upper bound on a single store call, in milliseconds
    pub op_timeout_ms: u64,
}

impl StoreConfig {
    /// Redis connection URL
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    /// Wait between connection attempts
    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    /// Upper bound on a single store call
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Expiry for write-backs, clamped to `1..=MAX_TTL_SECS`
    pub fn write_ttl_secs(&self) -> u64 {
        let ttl = self.ttl_secs.clamp(1, MAX_TTL_SECS);
        if ttl != self.ttl_secs {
            warn!("Entry TTL {}s is out of range, using {}s", self.ttl_secs, ttl);
        }
        ttl
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            host: "localhost".to_string(),
            port: 6379,
            ttl_secs: 60,
            connect_attempts: 5,
            connect_backoff_ms: 2000,
            op_timeout_ms: 500,
        }
    }
}

/// Synthetic workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Experiment name, also names the telemetry file
    pub run_name: String,

    /// Session length in hours (fractional allowed)
    pub duration_hours: f64,

    /// Maximum number of seeds loaded at startup
    pub seed_limit: usize,

    /// Poisson arrival rate (queries per second)
    pub steady_rate: f64,

    /// Fixed wait between burst queries, in milliseconds
    pub burst_interval_ms: u64,

    /// Queries per steady sub-burst in the mixed schedule
    pub steady_batch: u32,

    /// Queries per burst sub-burst in the mixed schedule
    pub burst_batch: u32,

    /// Relative weight of steady sub-bursts
    pub steady_weight: u32,

    /// Relative weight of burst sub-bursts
    pub burst_weight: u32,

    /// Write a telemetry row every N queries
    pub snapshot_every: u64,

    /// Fixed RNG seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl WorkloadConfig {
    /// Session length as a duration, or the default when the configured
    /// value is unusable
    pub fn duration(&self) -> Duration {
        let configured = Some(self.duration_hours)
            .filter(|hours| duration_hours_in_range(*hours))
            .and_then(|hours| Duration::try_from_secs_f64(hours * 3600.0).ok());

        match configured {
            Some(duration) => duration,
            None => {
                warn!(
                    "Duration {} hours is outside (0, {}], using {}",
                    self.duration_hours, MAX_DURATION_HOURS, DEFAULT_DURATION_HOURS
                );
                Duration::from_secs_f64(DEFAULT_DURATION_HOURS * 3600.0)
            }
        }
    }

    /// Fixed wait between burst queries
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            run_name: "default".to_string(),
            duration_hours: DEFAULT_DURATION_HOURS,
            seed_limit: 1000,
            steady_rate: 10.0,
            burst_interval_ms: 5,
            steady_batch: 20,
            burst_batch: 50,
            steady_weight: 3,
            burst_weight: 1,
            snapshot_every: 100,
            rng_seed: None,
        }
    }
}

/// Telemetry log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory holding one CSV file per run name
    pub results_dir: PathBuf,
}

impl TelemetryConfig {
    /// Telemetry file for a run
    pub fn log_path(&self, run_name: &str) -> PathBuf {
        self.results_dir.join(format!("{}.csv", run_name))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
        }
    }
}

/// Seed population configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedsConfig {
    /// JSON seed file
    pub path: Option<PathBuf>,

    /// Generate this many synthetic seeds when no file is set
    pub synthetic_count: Option<usize>,
}
