//! CLI argument parsing module for renovates

use crate::config::DEFAULT_CONFIG_PATH;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parse duration string in format: Ns (seconds), Nm (minutes), Nh (hours)
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60)
    } else {
        return Err(format!("invalid duration format: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", num_str))?;
    if num == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(Duration::from_secs(num * multiplier))
}

/// Run Renovate across many repositories and report the updates it finds
#[derive(Parser, Debug, Clone)]
#[command(
    name = "renovates",
    version,
    about = "Run Renovate across many repositories and report the updates it finds"
)]
pub struct CliArgs {
    /// Repositories to process (owner/name); when omitted, repositories are discovered
    pub repositories: Vec<String>,

    /// Configuration file; must exist when given [default: config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of repositories processed at once (overrides config)
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    pub concurrency: Option<i64>,

    /// Dry run mode - Renovate reports updates without creating branches or PRs
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Cancel a repository's run after this long (e.g., 90s, 30m, 2h)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Let Renovate discover the repositories itself
    #[arg(long, conflicts_with = "repositories")]
    pub autodiscover: bool,

    // Output options
    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Returns true if no configuration path was given
    pub fn uses_default_config(&self) -> bool {
        self.config.is_none()
    }

    /// The configuration path to read
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Returns true if a progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Default log filter directive for the chosen verbosity
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            "renovates=warn"
        } else if self.verbose {
            "renovates=debug"
        } else {
            "renovates=info"
        }
    }
}
