//! Spinners with CI fallback

use super::context::UiContext;
use crate::cache::Stats;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A one-shot task spinner (connect, load) with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with warning message
    pub fn stop_warn(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(style(message).yellow()),
            None => println!("{} {}", style("[WARN]").yellow(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Live query counter shown while a workload runs.
///
/// Interactive terminals get an indicatif spinner; plain mode prints a line
/// every `plain_every` queries.
#[derive(Clone)]
pub struct RunProgress {
    bar: Option<ProgressBar>,
    plain_every: u64,
}

impl RunProgress {
    pub fn new(ctx: &UiContext, label: &str, plain_every: u64) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new_spinner();
            let template = ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {prefix} {pos} queries  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
            bar.set_style(template);
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Running {} workload...", label);
            None
        };
        Self { bar, plain_every }
    }

    /// Record the counters after a query
    pub fn update(&self, queries: u64, stats: &Stats) {
        let rate = format_rate(stats);
        match self.bar {
            Some(ref bar) => {
                bar.set_position(queries);
                bar.set_message(rate);
            }
            None => {
                if self.plain_every > 0 && queries % self.plain_every == 0 {
                    println!("  {} queries, {}", queries, rate);
                }
            }
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

fn format_rate(stats: &Stats) -> String {
    match stats.hit_rate() {
        Some(rate) => format!("hit rate {:.1}%", rate),
        None => "hit rate -".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Connecting...");
        spinner.stop("Connected");
    }

    #[test]
    fn run_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = RunProgress::new(&ctx, "steady", 2);
        let stats = Stats {
            hits: 1,
            misses: 1,
            total_latency_ms: 0.4,
        };
        progress.update(1, &Stats::default());
        progress.update(2, &stats);
        progress.finish();
    }

    #[test]
    fn rate_formatting() {
        assert_eq!(format_rate(&Stats::default()), "hit rate -");
        let stats = Stats {
            hits: 3,
            misses: 1,
            total_latency_ms: 0.0,
        };
        assert_eq!(format_rate(&stats), "hit rate 75.0%");
    }
}
