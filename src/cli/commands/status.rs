//! Status command - probe the configured fast store

use crate::config::Config;
use crate::error::HitrateResult;
use crate::store::{self, ConnectionState};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the status command
pub async fn execute(config: &Config) -> HitrateResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "hitrate status");

    let handle = store::create_handle(&config.store)?;

    ui::section(&ctx, "Fast store");
    ui::key_value(&ctx, "Backend", handle.backend_name());
    ui::key_value(&ctx, "Address", &handle.address());
    ui::key_value(
        &ctx,
        "Retry policy",
        &format!(
            "{} attempts, {}ms apart",
            config.store.connect_attempts, config.store.connect_backoff_ms
        ),
    );

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Connecting...");
    let state = handle.connect().await;
    match state {
        ConnectionState::Connected => spinner.stop("Connected"),
        _ => spinner.stop_error("Could not connect"),
    }
    ui::key_value_status(&ctx, "State", state.label(), state.is_usable());

    if !state.is_usable() {
        ui::step_warn_hint(
            &ctx,
            "Runs against this store will count every lookup as a miss",
            "Start Redis or set HITRATE_STORE_HOST",
        );
        ui::outro_warn(&ctx, "Fast store unreachable");
        return Ok(());
    }

    match handle.probe().await {
        Ok(rtt) => {
            ui::key_value(
                &ctx,
                "PING",
                &format!("{:.3}ms", rtt.as_secs_f64() * 1000.0),
            );
            ui::outro_success(&ctx, "Fast store reachable");
        }
        Err(e) => {
            ui::step_error_detail(&ctx, "PING failed", &e.to_string());
            ui::outro_warn(&ctx, "Fast store degraded");
        }
    }

    Ok(())
}
