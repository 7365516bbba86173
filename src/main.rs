//! renovates - Run Renovate across many repositories
//!
//! Repositories come from the command line or from discovery. Each one gets
//! its own Renovate process, at most `concurrency` at a time, and the updates
//! Renovate reports are collected, sent to the configured notifiers and
//! summarized at the end.

use clap::Parser;
use renovates::aggregator::ResultAggregator;
use renovates::cli::CliArgs;
use renovates::config::{Config, DiscoverySource};
use renovates::discovery::create_discoverer;
use renovates::dispatcher::Dispatcher;
use renovates::domain::{BatchReport, Repository};
use renovates::error::ConfigError;
use renovates::http::HttpClient;
use renovates::notifier::{create_notifiers, ConsoleStream, NotifierOptions};
use renovates::output::{create_formatter, OutputConfig};
use renovates::progress::Progress;
use renovates::runner::{ToolCommand, ToolRunner};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when at least one repository failed
const EXIT_JOB_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration and apply command line overrides
fn load_config(args: &CliArgs) -> Result<Config, ConfigError> {
    let path = args.config_path();
    let mut config = if args.uses_default_config() {
        Config::load_or_default(&path)?
    } else {
        Config::load(&path)?
    };

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if args.timeout.is_some() {
        config.job_timeout_secs = args.timeout.map(|t| t.as_secs());
    }
    if args.autodiscover {
        config.discovery.enabled = true;
        config.discovery.source = DiscoverySource::Tool;
    }
    Ok(config)
}

/// Repositories from the command line, or from discovery
async fn select_repositories(
    args: &CliArgs,
    config: &Config,
    client: &HttpClient,
    progress: &mut Progress,
) -> anyhow::Result<Vec<Repository>> {
    if !args.repositories.is_empty() {
        return Ok(args
            .repositories
            .iter()
            .map(|name| Repository::new(name.as_str()).with_platform(config.platform.as_str()))
            .collect());
    }
    if !config.discovery.enabled {
        return Err(ConfigError::NoRepositories.into());
    }

    let discoverer = create_discoverer(config, client.clone())?;
    progress.spinner("Discovering repositories...");
    let discovered = discoverer.discover().await;
    progress.finish_and_clear();

    let repositories = discovered?;
    info!(
        source = discoverer.name(),
        count = repositories.len(),
        "Discovered repositories"
    );
    Ok(repositories)
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&args)?;
    let client = HttpClient::new()?;
    let mut progress = Progress::new(args.show_progress());

    let repositories = select_repositories(&args, &config, &client, &mut progress).await?;

    let notifier_options = NotifierOptions {
        endpoint: config.endpoint.clone(),
        // Keep stdout clean for the JSON report
        console: if args.json {
            ConsoleStream::Stderr
        } else {
            ConsoleStream::Stdout
        },
    };
    let notifiers = create_notifiers(&config.notifiers, client, &notifier_options)?;
    let aggregator = Arc::new(ResultAggregator::new(notifiers));
    debug!(notifiers = aggregator.notifier_count(), "Notifiers configured");
    let runner = Arc::new(ToolRunner::new(ToolCommand::from_config(&config)));

    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(runner, aggregator)
        .with_timeout(config.job_timeout())
        .with_cancel_token(cancel.clone());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running jobs");
            interrupt.cancel();
        }
    });

    info!(
        command = %config.command,
        repositories = repositories.len(),
        dry_run = config.dry_run,
        "Running"
    );
    let results = dispatcher
        .run_all_with_progress(&repositories, config.effective_concurrency(), &mut progress)
        .await;
    let report = BatchReport::new(results, config.dry_run);

    let no_color = std::env::var("NO_COLOR").ok();
    let color = OutputConfig::detect_color(io::stdout().is_terminal(), no_color.as_deref());
    let formatter = create_formatter(
        OutputConfig::from_cli(args.json, args.verbose, args.quiet).with_color(color),
    );
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    if report.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_JOB_FAILED))
    }
}
