//! Batch analytics report loader
//!
//! Batch jobs leave comma-delimited result files under a shared directory,
//! one per report at `<base>/output_<report>/part-r-00000`. Each file is
//! loaded whole into the fast store under `analytics:<report>` with no
//! expiry.

use crate::cache::CacheAccessor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Reports produced by the batch jobs
pub const REPORTS: [&str; 3] = ["by_type", "by_comuna", "temporal"];

/// Result file name inside each report directory
const PART_FILE: &str = "part-r-00000";

/// What happened to one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    /// Rows written to the fast store
    Loaded { rows: usize },
    /// No result file at the expected path
    Missing,
    /// File present but holds no rows
    Empty,
    /// File unreadable, or the fast store refused the write
    Failed(String),
}

/// Outcome for a named report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLoad {
    pub name: &'static str,
    pub path: PathBuf,
    pub status: ReportStatus,
}

/// Where a report's result file is expected
pub fn report_path(base: &Path, name: &str) -> PathBuf {
    base.join(format!("output_{}", name)).join(PART_FILE)
}

/// Split comma-delimited text into rows, ignoring blank lines
pub fn parse_rows(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

/// Load every known report found under `base` into the fast store.
///
/// Never fails as a whole: each report is attempted independently and its
/// status returned.
pub async fn load_reports(accessor: &CacheAccessor, base: &Path) -> Vec<ReportLoad> {
    let mut loads = Vec::with_capacity(REPORTS.len());
    for name in REPORTS {
        let path = report_path(base, name);
        let status = load_report(accessor, name, &path).await;
        loads.push(ReportLoad { name, path, status });
    }
    loads
}

async fn load_report(accessor: &CacheAccessor, name: &str, path: &Path) -> ReportStatus {
    if !path.exists() {
        warn!("No result file for report {} at {}", name, path.display());
        return ReportStatus::Missing;
    }

    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read report {} from {}: {}", name, path.display(), e);
            return ReportStatus::Failed(e.to_string());
        }
    };

    let rows = parse_rows(&content);
    if rows.is_empty() {
        debug!("Report {} is empty, skipping", name);
        return ReportStatus::Empty;
    }

    if accessor.store_report(name, &rows).await {
        info!("Loaded {} rows into analytics:{}", rows.len(), name);
        ReportStatus::Loaded { rows: rows.len() }
    } else {
        ReportStatus::Failed("fast store rejected the report".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ResilientStoreHandle, RetryPolicy};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn accessor() -> CacheAccessor {
        let handle = ResilientStoreHandle::new(Arc::new(MemoryStore::new()), RetryPolicy::default());
        handle.connect().await;
        CacheAccessor::new(Arc::new(handle))
    }

    async fn write_report(base: &Path, name: &str, content: &str) {
        let path = report_path(base, name);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, content).await.unwrap();
    }

    #[test]
    fn parses_comma_rows() {
        let rows = parse_rows("JAM,120\r\nACCIDENT,14\n\nHAZARD,3\n");
        assert_eq!(
            rows,
            vec![
                vec!["JAM".to_string(), "120".to_string()],
                vec!["ACCIDENT".to_string(), "14".to_string()],
                vec!["HAZARD".to_string(), "3".to_string()],
            ]
        );
    }

    #[test]
    fn report_paths() {
        assert_eq!(
            report_path(Path::new("/shared"), "by_type"),
            PathBuf::from("/shared/output_by_type/part-r-00000")
        );
    }

    #[tokio::test]
    async fn loads_present_reports_and_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        write_report(dir.path(), "by_type", "JAM,120\nACCIDENT,14\n").await;
        write_report(dir.path(), "temporal", "").await;

        let accessor = accessor().await;
        let loads = load_reports(&accessor, dir.path()).await;

        assert_eq!(loads.len(), 3);
        assert_eq!(loads[0].status, ReportStatus::Loaded { rows: 2 });
        assert_eq!(loads[1].status, ReportStatus::Missing);
        assert_eq!(loads[2].status, ReportStatus::Empty);

        let stored = accessor.fetch_report("by_type").await.unwrap();
        assert_eq!(stored[0], vec!["JAM".to_string(), "120".to_string()]);
        assert!(accessor.fetch_report("by_comuna").await.is_none());
    }

    #[tokio::test]
    async fn disconnected_store_fails_reports() {
        let dir = TempDir::new().unwrap();
        write_report(dir.path(), "by_comuna", "Santiago,40\n").await;

        let handle = ResilientStoreHandle::new(Arc::new(MemoryStore::new()), RetryPolicy::default());
        let accessor = CacheAccessor::new(Arc::new(handle));
        let loads = load_reports(&accessor, dir.path()).await;

        assert!(matches!(loads[1].status, ReportStatus::Failed(_)));
    }
}
