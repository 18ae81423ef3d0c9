use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

use tramtimes_client::{JsonFileStore, ReqwestFetcher, ScraperTableReader};
use tramtimes_core::backoff::Backoff;
use tramtimes_core::config::ScheduleConfig;
use tramtimes_core::models::{StopId, read_stops};
use tramtimes_core::policy::ResiliencePolicy;
use tramtimes_core::runner::{RunSummary, ScheduleRunner, TracingRunReporter};
use tramtimes_core::schedule::ScheduleService;
use tramtimes_core::target_date::target_date;

#[derive(Parser)]
#[command(name = "tramtimes", version, about = "Weekly midday departure schedules per stop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a weekly schedule file for every stop in the stop list
    Build {
        /// Stop list, one stop identifier per line
        #[arg(short, long, env = "TRAMTIMES_STOPS", default_value = "input/stops.txt")]
        stops: PathBuf,

        /// Directory the `_<STOP>.json` files are written to
        #[arg(short, long, env = "TRAMTIMES_OUTPUT_DIR", default_value = "output")]
        output: PathBuf,

        /// First day of the week to build (defaults to the computed target date)
        #[arg(short, long, env = "TRAMTIMES_DATE")]
        date: Option<NaiveDate>,

        /// Upstream site root
        #[arg(short, long, env = "TRAMTIMES_BASE_URL")]
        base_url: Option<Url>,

        /// Per-request timeout in seconds
        #[arg(short, long, env = "TRAMTIMES_TIMEOUT_SECS", default_value_t = 30)]
        timeout: u64,

        /// Seed for the jitter source (random if omitted)
        #[arg(long, env = "TRAMTIMES_SEED")]
        seed: Option<u64>,
    },

    /// Print the date the next build would start from
    TargetDate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tramtimes=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            stops,
            output,
            date,
            base_url,
            timeout,
            seed,
        } => {
            let target = date.unwrap_or_else(today_target);
            let summary = cmd_build(&stops, output, target, base_url, timeout, seed).await?;
            if !summary.is_success() {
                anyhow::bail!(
                    "{} stop(s) failed, {} skipped",
                    summary.failed.len(),
                    summary.skipped
                );
            }
        }
        Commands::TargetDate => {
            println!("{}", today_target().format("%Y-%m-%d"));
        }
    }

    Ok(())
}

fn today_target() -> NaiveDate {
    target_date(Local::now().naive_local())
}

fn load_stops(path: &Path) -> Result<Vec<StopId>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stop list: {}", path.display()))?;

    let stops = read_stops(&text);
    if stops.is_empty() {
        anyhow::bail!("No stops found in {}", path.display());
    }
    Ok(stops)
}

async fn cmd_build(
    stops_path: &Path,
    output: PathBuf,
    target: NaiveDate,
    base_url: Option<Url>,
    timeout_secs: u64,
    seed: Option<u64>,
) -> Result<RunSummary> {
    let stops = load_stops(stops_path)?;

    let mut config = ScheduleConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url.as_str());
    }

    let backoff = match seed {
        Some(seed) => Backoff::seeded(seed),
        None => Backoff::from_entropy(),
    };
    let policy = ResiliencePolicy::new(config.resilience.clone(), backoff.clone());

    let fetcher = ReqwestFetcher::with_timeout(Duration::from_secs(timeout_secs))
        .context("Failed to create HTTP client")?;

    tracing::info!(
        stops = stops.len(),
        %target,
        base_url = %config.base_url,
        output = %output.display(),
        "Building schedules"
    );

    let service = ScheduleService::with_store(
        fetcher,
        ScraperTableReader::new(),
        JsonFileStore::new(output),
        policy,
        backoff,
        config,
    );
    let runner = ScheduleRunner::new(service);

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current stop");
            ctrl_c_token.cancel();
        }
    });

    let summary = runner
        .run(&stops, target, cancel_token, &TracingRunReporter)
        .await;

    for failure in &summary.failed {
        eprintln!("  {} failed: {}", failure.stop, failure.error);
    }

    Ok(summary)
}
