//! Seed population for the workload driver
//!
//! A seed is a real (or realistic) record key with its coordinates. The
//! driver loads a bounded population once at startup and samples keys from
//! it; it never mutates the population.

use crate::config::schema::SeedsConfig;
use crate::error::{HitrateError, HitrateResult};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// One sampleable record: key plus location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub key: String,
    pub lon: f64,
    pub lat: f64,
}

/// Supplier of the seed population
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Return at most `limit` seeds
    async fn simulation_seeds(&self, limit: usize) -> HitrateResult<Vec<Seed>>;

    /// Description for logs and status output
    fn describe(&self) -> String;
}

/// Fixed in-memory population
#[derive(Debug, Clone, Default)]
pub struct StaticSeedSource {
    seeds: Vec<Seed>,
}

impl StaticSeedSource {
    pub fn new(seeds: Vec<Seed>) -> Self {
        Self { seeds }
    }
}

#[async_trait]
impl SeedSource for StaticSeedSource {
    async fn simulation_seeds(&self, limit: usize) -> HitrateResult<Vec<Seed>> {
        Ok(self.seeds.iter().take(limit).cloned().collect())
    }

    fn describe(&self) -> String {
        format!("{} static seeds", self.seeds.len())
    }
}

/// JSON file holding an array of seeds
#[derive(Debug, Clone)]
pub struct FileSeedSource {
    path: PathBuf,
}

impl FileSeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write seeds as a pretty JSON array
    pub async fn write(path: &Path, seeds: &[Seed]) -> HitrateResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| HitrateError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = serde_json::to_string_pretty(seeds)?;
        fs::write(path, content)
            .await
            .map_err(|e| HitrateError::io(format!("writing seed file {}", path.display()), e))
    }
}

#[async_trait]
impl SeedSource for FileSeedSource {
    async fn simulation_seeds(&self, limit: usize) -> HitrateResult<Vec<Seed>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            HitrateError::SeedSource(format!("reading {}: {}", self.path.display(), e))
        })?;

        let mut seeds: Vec<Seed> = serde_json::from_str(&content).map_err(|e| {
            HitrateError::SeedSource(format!("parsing {}: {}", self.path.display(), e))
        })?;
        seeds.truncate(limit);

        debug!("Read {} seeds from {}", seeds.len(), self.path.display());
        Ok(seeds)
    }

    fn describe(&self) -> String {
        format!("seed file {}", self.path.display())
    }
}

/// Geographic box seeds are drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Greater Santiago, where the incident feeds come from
    pub const SANTIAGO: Self = Self {
        min_lon: -70.85,
        max_lon: -70.45,
        min_lat: -33.65,
        max_lat: -33.30,
    };

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

/// Generated population with UUID keys, reproducible under a fixed RNG seed
#[derive(Debug, Clone)]
pub struct SyntheticSeedSource {
    count: usize,
    rng_seed: Option<u64>,
    bounds: BoundingBox,
}

impl SyntheticSeedSource {
    pub fn new(count: usize, rng_seed: Option<u64>) -> Self {
        Self {
            count,
            rng_seed,
            bounds: BoundingBox::SANTIAGO,
        }
    }

    /// Generate the population
    pub fn generate(&self) -> Vec<Seed> {
        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        (0..self.count)
            .map(|_| {
                let key = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
                Seed {
                    key: key.to_string(),
                    lon: rng.gen_range(self.bounds.min_lon..=self.bounds.max_lon),
                    lat: rng.gen_range(self.bounds.min_lat..=self.bounds.max_lat),
                }
            })
            .collect()
    }
}

#[async_trait]
impl SeedSource for SyntheticSeedSource {
    async fn simulation_seeds(&self, limit: usize) -> HitrateResult<Vec<Seed>> {
        let mut seeds = self.generate();
        seeds.truncate(limit);
        Ok(seeds)
    }

    fn describe(&self) -> String {
        format!("{} synthetic seeds", self.count)
    }
}

/// Pick the seed source from configuration.
///
/// A seed file wins over synthetic generation; with neither configured the
/// population is empty.
pub fn source_from_config(config: &SeedsConfig, rng_seed: Option<u64>) -> Box<dyn SeedSource> {
    if let Some(ref path) = config.path {
        return Box::new(FileSeedSource::new(path.clone()));
    }
    match config.synthetic_count {
        Some(count) => Box::new(SyntheticSeedSource::new(count, rng_seed)),
        None => Box::new(StaticSeedSource::default()),
    }
}

/// Load the population, turning source failures into an empty population.
///
/// The caller decides what an empty population means.
pub async fn load_population(source: &dyn SeedSource, limit: usize) -> Vec<Seed> {
    match source.simulation_seeds(limit).await {
        Ok(seeds) => seeds,
        Err(e) => {
            warn!("Could not load seeds from {}: {}", source.describe(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(key: &str) -> Seed {
        Seed {
            key: key.to_string(),
            lon: -70.6,
            lat: -33.4,
        }
    }

    #[tokio::test]
    async fn static_source_respects_limit() {
        let source = StaticSeedSource::new(vec![seed("a"), seed("b"), seed("c")]);
        assert_eq!(source.simulation_seeds(2).await.unwrap().len(), 2);
        assert_eq!(source.simulation_seeds(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn file_source_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seeds").join("santiago.json");
        let seeds = vec![seed("a"), seed("b")];

        FileSeedSource::write(&path, &seeds).await.unwrap();
        let loaded = FileSeedSource::new(&path).simulation_seeds(1000).await.unwrap();
        assert_eq!(loaded, seeds);
    }

    #[tokio::test]
    async fn missing_file_loads_empty_population() {
        let temp = TempDir::new().unwrap();
        let source = FileSeedSource::new(temp.path().join("nope.json"));

        assert!(matches!(
            source.simulation_seeds(10).await,
            Err(HitrateError::SeedSource(_))
        ));
        assert!(load_population(&source, 10).await.is_empty());
    }

    #[test]
    fn synthetic_is_reproducible_and_bounded() {
        let a = SyntheticSeedSource::new(50, Some(7)).generate();
        let b = SyntheticSeedSource::new(50, Some(7)).generate();
        assert_eq!(a, b);
        assert!(a
            .iter()
            .all(|s| BoundingBox::SANTIAGO.contains(s.lon, s.lat)));

        let mut keys: Vec<_> = a.iter().map(|s| s.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 50);
    }

    #[tokio::test]
    async fn config_selects_source() {
        let config = SeedsConfig {
            path: None,
            synthetic_count: Some(5),
        };
        let source = source_from_config(&config, Some(1));
        assert_eq!(source.simulation_seeds(1000).await.unwrap().len(), 5);

        let empty = source_from_config(&SeedsConfig::default(), None);
        assert!(empty.simulation_seeds(1000).await.unwrap().is_empty());
    }
}
