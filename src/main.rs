//! hitrate - cache hit-rate experiments
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use hitrate::cli::{commands, Cli, Commands};
use hitrate::config::ConfigManager;
use hitrate::error::HitrateResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> HitrateResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Seeds generation needs no configuration
    if let Commands::Seeds(args) = cli.command {
        init_logging(cli.verbose, false, "text");
        return commands::seeds(args).await;
    }

    // Environment overrides go on after logging so their warnings are seen
    let mut config = config_manager.load().await?;
    init_logging(cli.verbose, config.general.verbose, &config.general.log_format);
    config.apply_process_env();
    debug!("Using config file {}", config_manager.path().display());

    match cli.command {
        Commands::Seeds(_) => Ok(()),
        Commands::Run(args) => commands::run(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Analytics(args) => commands::analytics(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug; `verbose = true` in the
/// config counts as one `-v`
fn init_logging(count: u8, config_verbose: bool, format: &str) {
    let level = count.max(u8::from(config_verbose));
    let filter = match level {
        0 => EnvFilter::new("hitrate=warn"),
        1 => EnvFilter::new("hitrate=info"),
        _ => EnvFilter::new("hitrate=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
