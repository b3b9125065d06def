//! Terminal output for hitrate commands
//!
//! Uses `cliclack` for log lines and spinners, with automatic fallback to
//! plain output in CI/non-interactive environments. Live workload progress
//! uses an `indicatif` spinner.
//!
//! # Example
//!
//! ```rust,ignore
//! use hitrate::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! ui::intro(&ctx, "hitrate status");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Connecting to fast store...");
//! spinner.stop("Connected");
//!
//! ui::key_value(&ctx, "Backend", "redis");
//! ui::outro_success(&ctx, "Fast store reachable");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, remark, section,
    step_error_detail, step_info, step_ok, step_ok_detail, step_warn_hint,
};
pub use progress::{RunProgress, TaskSpinner};
