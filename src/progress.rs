//! Progress display for batch runs
//!
//! Shows a spinner while repositories are discovered and a bar of completed
//! jobs while the batch runs, using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.cyan} {prefix} [{bar:30.cyan/blue}] {pos}/{len} jobs ({elapsed}) {msg}";

/// Progress reporter for a batch
pub struct Progress {
    /// Whether progress display is enabled (disabled in quiet and JSON mode)
    enabled: bool,
    bar: Option<ProgressBar>,
}

fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    match fallback.clone().template(template) {
        Ok(style) => style,
        Err(e) => {
            debug!(error = %e, "Invalid progress template");
            fallback
        }
    }
}

impl Progress {
    /// Create a new progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a disabled progress reporter
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Returns true if anything will be drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show a spinner with a message for an indeterminate operation
    pub fn spinner(&mut self, message: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            style(SPINNER_TEMPLATE, ProgressStyle::default_spinner()).tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(spinner);
    }

    /// Start a progress bar for `total` jobs
    pub fn start(&mut self, total: u64, prefix: &str) {
        if !self.enabled || total == 0 {
            return;
        }

        let bar = ProgressBar::new(total);
        bar.set_style(style(BAR_TEMPLATE, ProgressStyle::default_bar()).progress_chars("█▓▒░"));
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Increment progress by one
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Update the message, e.g. the last finished repository
    pub fn set_message(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the current progress bar
    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_disabled() {
        let mut progress = Progress::disabled();
        progress.spinner("Discovering repositories");
        progress.start(10, "Running");
        progress.inc();
        progress.set_message("owner/app");
        progress.finish_and_clear();
        assert!(!progress.is_enabled());
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_progress_enabled() {
        let mut progress = Progress::new(true);
        progress.start(3, "Running");
        progress.inc();
        progress.set_message("owner/app");
        progress.inc();
        progress.finish_and_clear();
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_progress_empty_batch_draws_nothing() {
        let mut progress = Progress::new(true);
        progress.start(0, "Running");
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_templates_are_valid() {
        assert!(ProgressStyle::default_bar().template(BAR_TEMPLATE).is_ok());
        assert!(ProgressStyle::default_spinner().template(SPINNER_TEMPLATE).is_ok());
    }
}
