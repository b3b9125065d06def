//! Synthetic workload driver
//!
//! Samples seeds uniformly, looks each key up through the cache accessor,
//! writes a placeholder record back after every miss, and snapshots the
//! counters to the telemetry log on a fixed query cadence. All queries run
//! one at a time on the caller's task; waits between queries are tokio
//! sleeps that also watch the shutdown channel.

use crate::cache::{CacheAccessor, CacheRecord, Source, Stats};
use crate::config::schema::{StoreConfig, WorkloadConfig};
use crate::error::{HitrateError, HitrateResult};
use crate::seeds::Seed;
use crate::telemetry::{TelemetryLog, TelemetrySample};
use crate::workload::arrival::{ArrivalModel, MixedPlan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Pause between the two phases of a phased run
const PHASE_GAP: Duration = Duration::from_secs(1);

/// Per-run knobs that are not part of an arrival model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// Expiry for write-backs after a miss
    pub ttl_secs: u64,
    /// Telemetry row every N queries (0 disables periodic rows)
    pub snapshot_every: u64,
}

impl DriverSettings {
    pub fn from_config(store: &StoreConfig, workload: &WorkloadConfig) -> Self {
        Self {
            ttl_secs: store.write_ttl_secs(),
            snapshot_every: workload.snapshot_every,
        }
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            snapshot_every: 100,
        }
    }
}

/// Result of a single synthetic query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub key: String,
    pub source: Source,
    pub latency_ms: f64,
}

/// Totals for one run of an arrival model
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: &'static str,
    pub queries: u64,
    pub interrupted: bool,
    pub elapsed: Duration,
    pub stats: Stats,
}

/// Why a stretch of queries stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Deadline,
    Count,
    Interrupted,
}

/// Callback invoked after every query with the running query count
pub type QueryObserver = Box<dyn FnMut(u64, &Stats) + Send>;

/// Drives lookups against a [`CacheAccessor`] under an arrival model
pub struct WorkloadDriver {
    seeds: Vec<Seed>,
    accessor: CacheAccessor,
    telemetry: TelemetryLog,
    settings: DriverSettings,
    rng: StdRng,
    shutdown: Option<watch::Receiver<bool>>,
    observer: Option<QueryObserver>,
    started: Instant,
    queries: u64,
    flushed_at: Option<u64>,
}

impl WorkloadDriver {
    /// Create a driver over a loaded seed population.
    ///
    /// Refuses an empty population: there would be nothing to sample.
    pub fn new(
        seeds: Vec<Seed>,
        accessor: CacheAccessor,
        telemetry: TelemetryLog,
        settings: DriverSettings,
    ) -> HitrateResult<Self> {
        if seeds.is_empty() {
            return Err(HitrateError::EmptySeedPopulation);
        }
        info!("Loaded {} seed keys for simulation", seeds.len());

        Ok(Self {
            seeds,
            accessor,
            telemetry,
            settings,
            rng: StdRng::from_entropy(),
            shutdown: None,
            observer: None,
            started: Instant::now(),
            queries: 0,
            flushed_at: None,
        })
    }

    /// Use a specific random source (fixed seeds give reproducible runs)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Stop at the next query boundary once this channel reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Report progress after each query
    pub fn with_observer(mut self, observer: QueryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn accessor(&self) -> &CacheAccessor {
        &self.accessor
    }

    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    /// Queries issued since construction
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// One query: sample a seed, look it up, write back on a miss
    pub async fn simulate_query(&mut self) -> QueryOutcome {
        let seed = self.seeds[self.rng.gen_range(0..self.seeds.len())].clone();

        let result = self.accessor.lookup(&seed.key).await;
        let source = result.source();
        if !result.outcome.is_hit() {
            self.accessor
                .store(&seed.key, &placeholder_record(&seed), self.settings.ttl_secs)
                .await;
        }
        self.queries += 1;

        let label = if source == Source::Cache { "HIT " } else { "MISS" };
        debug!(
            "{} [{}] key:{}... | latency: {:.2}ms",
            label,
            source,
            short_key(&seed.key),
            result.latency_ms
        );

        if let Some(observer) = self.observer.as_mut() {
            observer(self.queries, &self.accessor.stats());
        }

        if self.settings.snapshot_every > 0 && self.queries % self.settings.snapshot_every == 0 {
            self.snapshot().await;
        }

        QueryOutcome {
            key: seed.key,
            source,
            latency_ms: result.latency_ms,
        }
    }

    /// Run one arrival model until `duration` elapses or shutdown
    pub async fn run_for(&mut self, model: ArrivalModel, duration: Duration) -> RunSummary {
        info!(
            "Starting {} arrivals for {:.1}s (~{:.0} queries expected)",
            model.name(),
            duration.as_secs_f64(),
            model.expected_queries(duration)
        );
        let begin = Instant::now();
        let before = self.queries;

        let stop = self.drive(model, begin + duration, None).await;
        self.complete(model.name(), begin, before, stop == Stop::Interrupted)
            .await
    }

    /// Run exactly `count` queries (fewer if `within` elapses or on shutdown)
    pub async fn run_queries(
        &mut self,
        model: ArrivalModel,
        count: u64,
        within: Duration,
    ) -> RunSummary {
        let begin = Instant::now();
        let before = self.queries;

        let stop = self.drive(model, begin + within, Some(count)).await;
        self.complete(model.name(), begin, before, stop == Stop::Interrupted)
            .await
    }

    /// Long-running session: weighted steady and burst sub-bursts until
    /// `duration` elapses or shutdown
    pub async fn run_mixed(&mut self, plan: &MixedPlan, duration: Duration) -> RunSummary {
        info!("Starting mixed schedule for {:.1}s", duration.as_secs_f64());
        let begin = Instant::now();
        let deadline = begin + duration;
        let before = self.queries;
        let mut interrupted = false;

        while Instant::now() < deadline {
            let (model, batch) = plan.choose(&mut self.rng);
            debug!("Sub-burst: {} x{}", model.name(), batch);

            if self.drive(model, deadline, Some(u64::from(batch))).await == Stop::Interrupted {
                interrupted = true;
                break;
            }
        }

        self.complete("mixed", begin, before, interrupted).await
    }

    /// Steady phase, a short pause, then a burst phase
    pub async fn run_phased(
        &mut self,
        steady: ArrivalModel,
        steady_for: Duration,
        burst: ArrivalModel,
        burst_for: Duration,
    ) -> Vec<RunSummary> {
        let mut first = self.run_for(steady, steady_for).await;
        info!("Steady phase: {}", self.accessor.metrics_summary());
        if first.interrupted {
            return vec![first];
        }

        if self.pause(PHASE_GAP).await {
            info!("Interrupted between phases");
            self.finish().await;
            first.interrupted = true;
            return vec![first];
        }

        let second = self.run_for(burst, burst_for).await;
        info!("Burst phase: {}", self.accessor.metrics_summary());
        vec![first, second]
    }

    /// Write a final telemetry row unless the last row already covers
    /// every query issued
    pub async fn finish(&mut self) -> Option<TelemetrySample> {
        if self.flushed_at == Some(self.queries) {
            return None;
        }
        self.snapshot().await
    }

    async fn snapshot(&mut self) -> Option<TelemetrySample> {
        let stats = self.accessor.stats();
        match self.telemetry.record(self.started, self.queries, &stats).await {
            Ok(sample) => {
                self.flushed_at = Some(self.queries);
                Some(sample)
            }
            Err(e) => {
                warn!("Telemetry row dropped: {}", e);
                None
            }
        }
    }

    async fn complete(
        &mut self,
        mode: &'static str,
        begin: Instant,
        before: u64,
        interrupted: bool,
    ) -> RunSummary {
        if interrupted {
            info!("Interrupted after {} queries", self.queries - before);
        }
        self.finish().await;

        RunSummary {
            mode,
            queries: self.queries - before,
            interrupted,
            elapsed: begin.elapsed(),
            stats: self.accessor.stats(),
        }
    }

    async fn drive(&mut self, model: ArrivalModel, deadline: Instant, max: Option<u64>) -> Stop {
        let mut issued = 0u64;

        loop {
            if self.shutdown_requested() {
                return Stop::Interrupted;
            }
            if max.is_some_and(|max| issued >= max) {
                return Stop::Count;
            }
            let now = Instant::now();
            if now >= deadline {
                return Stop::Deadline;
            }

            self.simulate_query().await;
            issued += 1;

            let wait = model
                .next_wait(&mut self.rng)
                .min(deadline.saturating_duration_since(Instant::now()));
            if self.pause(wait).await {
                return Stop::Interrupted;
            }
        }
    }

    /// Sleep for `wait`; returns true if shutdown arrived first
    async fn pause(&mut self, wait: Duration) -> bool {
        match self.shutdown.as_mut() {
            None => {
                tokio::time::sleep(wait).await;
                false
            }
            Some(rx) => tokio::select! {
                _ = tokio::time::sleep(wait) => false,
                _ = wait_for_shutdown(rx) => true,
            },
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Resolves once the channel reads `true`; never resolves if the sender is
/// gone without having signalled
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Stand-in for the record the source of record would have returned
fn placeholder_record(seed: &Seed) -> CacheRecord {
    CacheRecord::new(serde_json::json!({
        "uuid": seed.key,
        "lat": seed.lat,
        "lon": seed.lon,
        "info": "Simulated payload",
    }))
}

fn short_key(key: &str) -> &str {
    key.char_indices().nth(8).map_or(key, |(i, _)| &key[..i])
}
