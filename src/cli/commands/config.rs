//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::schema::{self, StoreBackend, MAX_TTL_SECS};
use crate::config::{Config, ConfigManager};
use crate::error::{HitrateError, HitrateResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use std::str::FromStr;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "store.backend",
    "store.host",
    "store.port",
    "store.ttl_secs",
    "store.connect_attempts",
    "store.connect_backoff_ms",
    "store.op_timeout_ms",
    "workload.run_name",
    "workload.duration_hours",
    "workload.seed_limit",
    "workload.steady_rate",
    "workload.burst_interval_ms",
    "workload.steady_batch",
    "workload.burst_batch",
    "workload.steady_weight",
    "workload.burst_weight",
    "workload.snapshot_every",
    "workload.rng_seed",
    "telemetry.results_dir",
    "seeds.path",
    "seeds.synthetic_count",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> HitrateResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> HitrateResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> HitrateResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Update one key in the file-backed configuration (environment overrides
/// are not persisted)
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> HitrateResult<()> {
    let ctx = UiContext::detect();
    let mut config = manager.load().await?;

    if let Err(e) = apply_key(&mut config, key, value) {
        if !VALID_KEYS.contains(&key) {
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, "Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
            return Ok(());
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
    Ok(())
}

fn apply_key(config: &mut Config, key: &str, value: &str) -> HitrateResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let general = &mut config.general;
    let store = &mut config.store;
    let workload = &mut config.workload;

    match parts.as_slice() {
        ["general", "verbose"] => general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => general.log_format = value.to_string(),
            _ => return Err(invalid(key, value, "expected text or json")),
        },

        ["store", "backend"] => {
            store.backend = match value.to_lowercase().as_str() {
                "redis" => StoreBackend::Redis,
                "memory" => StoreBackend::Memory,
                _ => return Err(invalid(key, value, "expected redis or memory")),
            }
        }
        ["store", "host"] => store.host = value.to_string(),
        ["store", "port"] => store.port = parse(key, value)?,
        ["store", "ttl_secs"] => {
            let ttl: u64 = parse(key, value)?;
            if ttl == 0 || ttl > MAX_TTL_SECS {
                return Err(invalid(key, value, &format!("must be 1..={}", MAX_TTL_SECS)));
            }
            store.ttl_secs = ttl;
        }
        ["store", "connect_attempts"] => store.connect_attempts = parse(key, value)?,
        ["store", "connect_backoff_ms"] => store.connect_backoff_ms = parse(key, value)?,
        ["store", "op_timeout_ms"] => store.op_timeout_ms = parse(key, value)?,

        ["workload", "run_name"] => workload.run_name = value.to_string(),
        ["workload", "duration_hours"] => {
            let hours: f64 = parse(key, value)?;
            if !schema::duration_hours_in_range(hours) {
                return Err(invalid(key, value, "must be positive and at most one year"));
            }
            workload.duration_hours = hours;
        }
        ["workload", "seed_limit"] => workload.seed_limit = parse(key, value)?,
        ["workload", "steady_rate"] => workload.steady_rate = parse(key, value)?,
        ["workload", "burst_interval_ms"] => workload.burst_interval_ms = parse(key, value)?,
        ["workload", "steady_batch"] => workload.steady_batch = parse(key, value)?,
        ["workload", "burst_batch"] => workload.burst_batch = parse(key, value)?,
        ["workload", "steady_weight"] => workload.steady_weight = parse(key, value)?,
        ["workload", "burst_weight"] => workload.burst_weight = parse(key, value)?,
        ["workload", "snapshot_every"] => workload.snapshot_every = parse(key, value)?,
        ["workload", "rng_seed"] => workload.rng_seed = Some(parse(key, value)?),

        ["telemetry", "results_dir"] => config.telemetry.results_dir = PathBuf::from(value),
        ["seeds", "path"] => config.seeds.path = Some(PathBuf::from(value)),
        ["seeds", "synthetic_count"] => config.seeds.synthetic_count = Some(parse(key, value)?),

        _ => return Err(HitrateError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse<T: FromStr>(key: &str, value: &str) -> HitrateResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "not a valid number"))
}

fn parse_bool(value: &str) -> HitrateResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(HitrateError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> HitrateError {
    HitrateError::User(format!("Invalid value '{}' for {}: {}", value, key, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply_key(&mut config, "store.host", "cache.internal").unwrap();
        apply_key(&mut config, "store.backend", "memory").unwrap();
        apply_key(&mut config, "workload.duration_hours", "0.5").unwrap();
        apply_key(&mut config, "workload.rng_seed", "42").unwrap();
        apply_key(&mut config, "seeds.path", "/data/seeds.json").unwrap();

        assert_eq!(config.store.host, "cache.internal");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.workload.duration_hours, 0.5);
        assert_eq!(config.workload.rng_seed, Some(42));
        assert_eq!(config.seeds.path, Some(PathBuf::from("/data/seeds.json")));
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply_key(&mut config, "store.port", "not-a-port").is_err());
        assert!(apply_key(&mut config, "workload.duration_hours", "-2").is_err());
        assert!(apply_key(&mut config, "workload.duration_hours", "1e16").is_err());
        assert!(apply_key(&mut config, "store.ttl_secs", "0").is_err());
        assert!(apply_key(&mut config, "store.ttl_secs", "99999999999").is_err());
        assert!(apply_key(&mut config, "general.log_format", "xml").is_err());
        assert!(apply_key(&mut config, "nope.key", "1").is_err());
    }

    #[test]
    fn every_listed_key_is_settable() {
        for key in VALID_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "general.verbose" => "true",
                "general.log_format" => "json",
                "store.backend" => "redis",
                "store.host" | "workload.run_name" | "telemetry.results_dir" | "seeds.path" => {
                    "x"
                }
                _ => "3",
            };
            assert!(apply_key(&mut config, key, value).is_ok(), "key {}", key);
        }
    }

    #[tokio::test]
    async fn set_persists_to_file() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        set_value(&manager, "workload.run_name", "lru").await.unwrap();
        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.workload.run_name, "lru");
    }
}
