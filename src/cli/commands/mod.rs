//! CLI command implementations

pub mod analytics;
pub mod config;
pub mod run;
pub mod seeds;
pub mod status;

pub use analytics::execute as analytics;
pub use config::execute as config;
pub use run::execute as run;
pub use seeds::execute as seeds;
pub use status::execute as status;
