//! hitrate - cache hit-rate experiments
//!
//! Fronts a slow source of record with a fast key-value store (Redis),
//! drives a synthetic query workload through it and logs how the hit rate
//! evolves over time.

pub mod analytics;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod seeds;
pub mod store;
pub mod telemetry;
pub mod ui;
pub mod workload;

pub use error::{HitrateError, HitrateResult};
