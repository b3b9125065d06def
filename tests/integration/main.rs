//! Integration tests for hitrate

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn hitrate(config_dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("hitrate");
        cmd.arg("--config")
            .arg(config_dir.join("config.toml"))
            .env_remove("HITRATE_CONFIG")
            .env_remove("HITRATE_RUN_NAME")
            .env_remove("HITRATE_DURATION_HOURS")
            .env_remove("HITRATE_STORE_HOST");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("hit-rate"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("hitrate"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[store]"))
            .stdout(predicate::str::contains("port = 6379"));
    }

    #[test]
    fn config_set_then_show() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .args(["config", "set", "workload.run_name", "lfu"])
            .assert()
            .success();

        hitrate(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("run_name = \"lfu\""));
    }

    #[test]
    fn env_overrides_run_name() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .env("HITRATE_RUN_NAME", "from-env")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("run_name = \"from-env\""));
    }

    #[test]
    fn seeds_generation_writes_file() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("seeds.json");

        hitrate(temp.path())
            .args(["seeds", "--count", "25", "--rng-seed", "3", "--out"])
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote 25 seeds"));

        let content = std::fs::read_to_string(&out).unwrap();
        let seeds: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(seeds.as_array().unwrap().len(), 25);
    }

    #[test]
    fn empty_population_is_diagnosed() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .args(["run", "--store", "memory", "--results-dir"])
            .arg(temp.path().join("results"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Seed population is empty"))
            .stderr(predicate::str::contains("hitrate seeds"));
    }

    #[test]
    fn memory_run_writes_telemetry() {
        let temp = TempDir::new().unwrap();
        let results = temp.path().join("results");

        hitrate(temp.path())
            .args([
                "run",
                "--store",
                "memory",
                "--mode",
                "burst",
                "--synthetic",
                "20",
                "--rng-seed",
                "11",
                "--duration-hours",
                "0.0003",
                "--name",
                "itest",
                "--results-dir",
            ])
            .arg(&results)
            .assert()
            .success()
            .stdout(predicate::str::contains("Hit Rate"));

        let log = std::fs::read_to_string(results.join("itest.csv")).unwrap();
        let mut lines = log.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,seconds_elapsed,total_queries,hit_rate")
        );
        let rows: Vec<&str> = lines.collect();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|row| row.split(',').count() == 4));
    }

    #[test]
    fn analytics_with_missing_reports_succeeds() {
        let temp = TempDir::new().unwrap();
        hitrate(temp.path())
            .args(["analytics", "--store", "memory", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("0 of 3 reports loaded"));
    }

    #[test]
    fn status_with_memory_backend() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[store]\nbackend = \"memory\"\n",
        )
        .unwrap();

        hitrate(temp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("memory"))
            .stdout(predicate::str::contains("connected"));
    }
}
