//! Append-only hit-rate telemetry log
//!
//! Writes CSV rows to `<results_dir>/<run_name>.csv`:
//!
//! ```text
//! timestamp,seconds_elapsed,total_queries,hit_rate
//! 14:02:11,12.48,100,61.00
//! ```
//!
//! The header is written only when the file is new or empty, so a run name
//! reused across restarts keeps appending to the same log.

use crate::cache::Stats;
use crate::error::{HitrateError, HitrateResult};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::debug;

/// CSV header row
pub const HEADER: &str = "timestamp,seconds_elapsed,total_queries,hit_rate";

/// One periodic snapshot of the accessor counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub wall_clock: DateTime<Local>,
    pub seconds_elapsed: f64,
    pub total_queries: u64,
    pub hit_rate: f64,
}

impl TelemetrySample {
    /// Build a sample from counters observed `seconds_elapsed` into a run
    pub fn from_stats(seconds_elapsed: f64, total_queries: u64, stats: &Stats) -> Self {
        Self {
            wall_clock: Local::now(),
            seconds_elapsed,
            total_queries,
            hit_rate: stats.hit_rate().unwrap_or(0.0),
        }
    }

    /// Format as one CSV line, without the trailing newline
    pub fn to_row(&self) -> String {
        format!(
            "{},{:.2},{},{:.2}",
            self.wall_clock.format("%H:%M:%S"),
            self.seconds_elapsed,
            self.total_queries,
            self.hit_rate
        )
    }
}

/// File-backed telemetry log for one run
pub struct TelemetryLog {
    path: PathBuf,
    header_checked: bool,
    last: Option<(f64, u64)>,
}

impl TelemetryLog {
    /// Log at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header_checked: false,
            last: None,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for the current counters.
    ///
    /// Elapsed time and query count are clamped so rows within a run never
    /// go backwards.
    pub async fn record(
        &mut self,
        started: Instant,
        query_count: u64,
        stats: &Stats,
    ) -> HitrateResult<TelemetrySample> {
        let mut elapsed = started.elapsed().as_secs_f64();
        let mut queries = query_count;
        if let Some((last_elapsed, last_queries)) = self.last {
            elapsed = elapsed.max(last_elapsed);
            queries = queries.max(last_queries);
        }

        let sample = TelemetrySample::from_stats(elapsed, queries, stats);
        self.append(&sample).await?;
        self.last = Some((elapsed, queries));

        debug!(
            "Telemetry: {:.2}s, {} queries, {:.2}% hit rate",
            sample.seconds_elapsed, sample.total_queries, sample.hit_rate
        );
        Ok(sample)
    }

    async fn append(&mut self, sample: &TelemetrySample) -> HitrateResult<()> {
        let mut chunk = String::new();
        if !self.header_checked {
            if self.needs_header().await {
                chunk.push_str(HEADER);
                chunk.push('\n');
            }
            self.header_checked = true;
        }
        chunk.push_str(&sample.to_row());
        chunk.push('\n');

        self.write_chunk(&chunk)
            .await
            .map_err(|e| HitrateError::io(format!("appending to {}", self.path.display()), e))
    }

    async fn needs_header(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        }
    }

    async fn write_chunk(&self, chunk: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        // One write per row so an interrupted run never leaves half a line
        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
