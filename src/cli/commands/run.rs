//! Run command - drive a synthetic workload through the cache

use crate::cache::{CacheAccessor, Stats};
use crate::cli::args::{RunArgs, RunMode};
use crate::config::schema::{self, WorkloadConfig, MAX_DURATION_HOURS};
use crate::config::Config;
use crate::error::{HitrateError, HitrateResult};
use crate::seeds;
use crate::store::{self, ConnectionState};
use crate::telemetry::TelemetryLog;
use crate::ui::{self, RunProgress, TaskSpinner, UiContext};
use crate::workload::{ArrivalModel, DriverSettings, MixedPlan, RunSummary, WorkloadDriver};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Resolved arrival schedule for one run
#[derive(Debug)]
enum Schedule {
    Single(ArrivalModel),
    Mixed(MixedPlan),
    Phased {
        steady: ArrivalModel,
        burst: ArrivalModel,
    },
}

impl Schedule {
    fn resolve(mode: RunMode, workload: &WorkloadConfig) -> HitrateResult<Self> {
        Ok(match mode {
            RunMode::Steady => Self::Single(ArrivalModel::steady(workload.steady_rate)?),
            RunMode::Burst => Self::Single(ArrivalModel::burst(workload.burst_interval())),
            RunMode::Mixed => Self::Mixed(MixedPlan::from_config(workload)?),
            RunMode::Phased => Self::Phased {
                steady: ArrivalModel::steady(workload.steady_rate)?,
                burst: ArrivalModel::burst(workload.burst_interval()),
            },
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Single(model) => model.name(),
            Self::Mixed(_) => "mixed",
            Self::Phased { .. } => "phased",
        }
    }
}

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> HitrateResult<()> {
    let ctx = UiContext::detect();
    let config = apply_overrides(&args, config)?;
    let workload = &config.workload;

    // Validate the schedule before touching the network
    let schedule = Schedule::resolve(args.mode, workload)?;

    ui::intro(&ctx, &format!("hitrate run: {}", workload.run_name));

    let source = seeds::source_from_config(&config.seeds, workload.rng_seed);
    let population = seeds::load_population(source.as_ref(), workload.seed_limit).await;
    if population.is_empty() {
        return Err(HitrateError::EmptySeedPopulation);
    }
    ui::step_ok_detail(
        &ctx,
        &format!("Loaded {} seeds", population.len()),
        &source.describe(),
    );

    let handle = Arc::new(store::create_handle(&config.store)?);
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Connecting to {} at {}...",
        handle.backend_name(),
        handle.address()
    ));
    match handle.connect().await {
        ConnectionState::Connected => spinner.stop("Fast store connected"),
        _ => spinner.stop_warn("Fast store unreachable, every lookup will miss"),
    }

    let telemetry = TelemetryLog::new(config.telemetry.log_path(&workload.run_name));
    ui::key_value(&ctx, "Telemetry", &telemetry.path().display().to_string());
    let duration = workload.duration();
    ui::key_value(&ctx, "Schedule", schedule.label());
    ui::key_value(
        &ctx,
        "Duration",
        &format!("{:.2}h", duration.as_secs_f64() / 3600.0),
    );

    let progress = RunProgress::new(&ctx, schedule.label(), workload.snapshot_every);
    let observer_progress = progress.clone();

    let mut driver = WorkloadDriver::new(
        population,
        CacheAccessor::new(handle),
        telemetry,
        DriverSettings::from_config(&config.store, workload),
    )?
    .with_shutdown(interrupt_channel())
    .with_observer(Box::new(move |queries: u64, stats: &Stats| {
        observer_progress.update(queries, stats)
    }));
    if let Some(seed) = workload.rng_seed {
        driver = driver.with_rng(StdRng::seed_from_u64(seed));
    }

    let summaries = match schedule {
        Schedule::Single(model) => vec![driver.run_for(model, duration).await],
        Schedule::Mixed(plan) => vec![driver.run_mixed(&plan, duration).await],
        Schedule::Phased { steady, burst } => {
            let (steady_for, burst_for) = phase_split(duration);
            driver
                .run_phased(steady, steady_for, burst, burst_for)
                .await
        }
    };
    progress.finish();

    report(&ctx, &summaries);
    ui::step_info(&ctx, &driver.accessor().metrics_summary());

    let log_path = driver.telemetry().path().display().to_string();
    if summaries.iter().any(|s| s.interrupted) {
        ui::outro_warn(&ctx, &format!("Run interrupted, telemetry in {}", log_path));
    } else {
        ui::outro_success(&ctx, &format!("Run complete, telemetry in {}", log_path));
    }

    Ok(())
}

/// Fold command-line flags over the loaded configuration
fn apply_overrides(args: &RunArgs, config: &Config) -> HitrateResult<Config> {
    let mut config = config.clone();

    if let Some(ref name) = args.name {
        config.workload.run_name = name.clone();
    }
    if let Some(hours) = args.duration_hours {
        if !schema::duration_hours_in_range(hours) {
            return Err(HitrateError::User(format!(
                "--duration-hours must be in (0, {}], got {}",
                MAX_DURATION_HOURS, hours
            )));
        }
        config.workload.duration_hours = hours;
    }
    if let Some(rate) = args.rate {
        config.workload.steady_rate = rate;
    }
    if let Some(backend) = args.store {
        config.store.backend = backend.into();
    }
    if let Some(ref path) = args.seeds {
        config.seeds.path = Some(path.clone());
        config.seeds.synthetic_count = None;
    }
    if let Some(count) = args.synthetic {
        config.seeds.path = None;
        config.seeds.synthetic_count = Some(count);
    }
    if args.rng_seed.is_some() {
        config.workload.rng_seed = args.rng_seed;
    }
    if let Some(ref dir) = args.results_dir {
        config.telemetry.results_dir = dir.clone();
    }

    debug!("Effective run configuration: {:?}", config.workload);
    Ok(config)
}

/// Ctrl-C flips the returned channel to `true`
fn interrupt_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current query");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Two thirds steady, one third burst
fn phase_split(total: Duration) -> (Duration, Duration) {
    let steady = total * 2 / 3;
    (steady, total.saturating_sub(steady))
}

fn report(ctx: &UiContext, summaries: &[RunSummary]) {
    for summary in summaries {
        ui::section(ctx, &format!("Phase: {}", summary.mode));
        ui::key_value(ctx, "Queries", &summary.queries.to_string());
        ui::key_value(
            ctx,
            "Elapsed",
            &format!("{:.1}s", summary.elapsed.as_secs_f64()),
        );
        let rate = summary
            .stats
            .hit_rate()
            .map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r));
        ui::key_value_status(ctx, "Hit rate", &rate, !summary.interrupted);
        if let Some(latency) = summary.stats.mean_latency_ms() {
            ui::key_value(ctx, "Mean lookup", &format!("{:.3}ms", latency));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::BackendArg;
    use crate::config::schema::StoreBackend;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: RunArgs,
        }
        let mut argv = vec!["run"];
        argv.extend_from_slice(extra);
        Wrapper::parse_from(argv).args
    }

    #[test]
    fn overrides_apply_over_config() {
        let args = run_args(&[
            "--name",
            "lfu",
            "--duration-hours",
            "0.5",
            "--store",
            "memory",
            "--synthetic",
            "10",
        ]);
        let mut base = Config::default();
        base.seeds.path = Some("seeds.json".into());

        let config = apply_overrides(&args, &base).unwrap();
        assert_eq!(config.workload.run_name, "lfu");
        assert_eq!(config.workload.duration_hours, 0.5);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.seeds.path, None);
        assert_eq!(config.seeds.synthetic_count, Some(10));
        assert_eq!(args.store, Some(BackendArg::Memory));
    }

    #[test]
    fn non_positive_duration_flag_rejected() {
        let args = run_args(&["--duration-hours", "0"]);
        assert!(apply_overrides(&args, &Config::default()).is_err());
    }

    #[test]
    fn oversized_duration_flag_rejected() {
        let args = run_args(&["--duration-hours", "1e16"]);
        assert!(apply_overrides(&args, &Config::default()).is_err());
    }

    #[test]
    fn bad_rate_rejected_before_connecting() {
        let mut workload = WorkloadConfig::default();
        workload.steady_rate = 0.0;
        assert!(Schedule::resolve(RunMode::Steady, &workload).is_err());
        assert!(Schedule::resolve(RunMode::Burst, &workload).is_ok());
    }

    #[test]
    fn phases_split_two_to_one() {
        let (steady, burst) = phase_split(Duration::from_secs(90));
        assert_eq!(steady, Duration::from_secs(60));
        assert_eq!(burst, Duration::from_secs(30));
    }
}
