//! CLI argument definitions using clap derive

use crate::config::schema::StoreBackend;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// hitrate - cache hit-rate experiments against Redis
///
/// Fronts a slow source of record with a fast key-value store, drives a
/// synthetic query workload through it and logs the hit rate over time.
#[derive(Parser, Debug)]
#[command(name = "hitrate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HITRATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a synthetic workload and log the hit rate
    Run(RunArgs),

    /// Probe the configured fast store
    Status,

    /// Generate a synthetic seed file
    Seeds(SeedsArgs),

    /// Load batch analytics reports into the fast store
    Analytics(AnalyticsArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arrival schedule for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RunMode {
    /// Poisson arrivals for the whole run
    Steady,
    /// Fixed short interval for the whole run
    Burst,
    /// Weighted steady and burst sub-bursts
    #[default]
    Mixed,
    /// Steady phase, pause, burst phase
    Phased,
}

/// Fast store backend selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Redis,
    Memory,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Redis => StoreBackend::Redis,
            BackendArg::Memory => StoreBackend::Memory,
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Arrival schedule
    #[arg(short, long, value_enum, default_value_t = RunMode::Mixed)]
    pub mode: RunMode,

    /// Run name; telemetry goes to <results_dir>/<name>.csv
    #[arg(short, long)]
    pub name: Option<String>,

    /// Run length in hours (fractional allowed)
    #[arg(short, long)]
    pub duration_hours: Option<f64>,

    /// Steady arrival rate in queries per second
    #[arg(long)]
    pub rate: Option<f64>,

    /// Fast store backend
    #[arg(long, value_enum)]
    pub store: Option<BackendArg>,

    /// JSON seed file
    #[arg(long, conflicts_with = "synthetic")]
    pub seeds: Option<PathBuf>,

    /// Generate N synthetic seeds instead of reading a file
    #[arg(long, value_name = "N")]
    pub synthetic: Option<usize>,

    /// Fix the random source for a reproducible run
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Directory for telemetry files
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

/// Arguments for the seeds command
#[derive(Parser, Debug)]
pub struct SeedsArgs {
    /// Number of seeds to generate
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    /// Output file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Fix the random source for a reproducible population
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

/// Arguments for the analytics command
#[derive(Parser, Debug)]
pub struct AnalyticsArgs {
    /// Directory holding output_<report>/part-r-00000 files
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Fast store backend
    #[arg(long, value_enum)]
    pub store: Option<BackendArg>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., store.host)
        key: String,
        /// Value to set
        value: String,
    },
}
