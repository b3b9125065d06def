//! Analytics command - load batch report files into the fast store

use crate::analytics::{self, ReportStatus};
use crate::cache::CacheAccessor;
use crate::cli::args::AnalyticsArgs;
use crate::config::Config;
use crate::error::HitrateResult;
use crate::store::{self, ConnectionState};
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the analytics command
pub async fn execute(args: AnalyticsArgs, config: &Config) -> HitrateResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "hitrate analytics");

    let mut store_config = config.store.clone();
    if let Some(backend) = args.store {
        store_config.backend = backend.into();
    }

    let handle = Arc::new(store::create_handle(&store_config)?);
    if handle.connect().await == ConnectionState::Disconnected {
        ui::step_warn_hint(
            &ctx,
            &format!("Fast store at {} unreachable", handle.address()),
            "Reports will not be loaded",
        );
    }

    let accessor = CacheAccessor::new(handle);
    let loads = analytics::load_reports(&accessor, &args.dir).await;

    let mut loaded = 0;
    for load in &loads {
        match &load.status {
            ReportStatus::Loaded { rows } => {
                loaded += 1;
                ui::step_ok(
                    &ctx,
                    &format!("{} records loaded into 'analytics:{}'", rows, load.name),
                );
            }
            ReportStatus::Missing => ui::step_warn_hint(
                &ctx,
                &format!("No result file for {}", load.name),
                &load.path.display().to_string(),
            ),
            ReportStatus::Empty => ui::remark(&ctx, &format!("{} is empty, skipped", load.name)),
            ReportStatus::Failed(reason) => {
                ui::step_error_detail(&ctx, &format!("Report {} not loaded", load.name), reason)
            }
        }
    }

    if loaded == loads.len() {
        ui::outro_success(&ctx, "All reports loaded");
    } else {
        ui::outro_warn(&ctx, &format!("{} of {} reports loaded", loaded, loads.len()));
    }
    Ok(())
}
