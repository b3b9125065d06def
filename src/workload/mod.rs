//! Synthetic workload generation
//!
//! - `arrival`: when queries happen (steady Poisson, burst, mixed plan)
//! - `driver`: what each query does and when telemetry is written

pub mod arrival;
pub mod driver;

pub use arrival::{ArrivalModel, MixedPlan};
pub use driver::{DriverSettings, QueryObserver, QueryOutcome, RunSummary, WorkloadDriver};
