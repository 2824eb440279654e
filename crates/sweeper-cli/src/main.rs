use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sweeper_core::app::{PartitionOutcome, RunSummary, Sweeper, SweepConfig};
use sweeper_core::domain::{CaseRecord, ExpiryWindow};
use sweeper_core::impls::InMemoryCaseStore;
use sweeper_core::ports::{Clock, FixedClock, SystemClock};

/// sweeper - 期限切れ follow-up action のスイープ
#[derive(Parser)]
#[command(name = "sweeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sweep against cases loaded from a JSON fixture
    Run {
        /// Sweep configuration (TOML)
        #[arg(long, env = "SWEEPER_CONFIG")]
        config: PathBuf,

        /// JSON array of case records used to seed the in-memory case store
        #[arg(long)]
        cases: PathBuf,

        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Select cases but do not send any event
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective cutoff date
    Cutoff {
        /// Reference date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            config,
            cases,
            today,
            dry_run,
            json,
        } => run(&config, &cases, today, dry_run, json).await,
        Commands::Cutoff { date } => {
            let reference = date.unwrap_or_else(|| SystemClock.today());
            let window = ExpiryWindow::for_reference(reference);
            println!("{}", window.cutoff);
            Ok(())
        }
    }
}

async fn run(
    config_path: &Path,
    cases_path: &Path,
    today: Option<NaiveDate>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let mut config = SweepConfig::from_path(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if dry_run {
        config.dry_run = true;
    }

    let cases = load_cases(cases_path)?;
    info!(cases = cases.len(), path = %cases_path.display(), "seeded in-memory case store");
    let store = Arc::new(InMemoryCaseStore::with_cases(cases));

    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock::on(date)),
        None => Arc::new(SystemClock),
    };

    let sweeper = Sweeper::builder(config)
        .store(store)
        .clock(clock)
        .build()
        .context("building sweeper")?;

    let summary = sweeper.run().await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serializing run summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn load_cases(path: &Path) -> Result<Vec<CaseRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading cases from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing cases in {}", path.display()))
}

fn print_summary(summary: &RunSummary) {
    println!(
        "reference date {} / cutoff {}{}",
        summary.reference_date,
        summary.cutoff,
        if summary.dry_run { " (dry run)" } else { "" }
    );
    for report in &summary.partitions {
        match &report.outcome {
            PartitionOutcome::Skipped { gate } => {
                println!("  {}: skipped (gate {gate} disabled)", report.case_type);
            }
            PartitionOutcome::ScanFailed { error } => {
                println!("  {}: scan failed: {error}", report.case_type);
            }
            PartitionOutcome::Completed {
                scanned,
                selected,
                dispatch,
            } => {
                println!(
                    "  {}: scanned {scanned}, selected {}",
                    report.case_type,
                    selected.len()
                );
                if let Some(dispatch) = dispatch {
                    println!(
                        "    dispatched {}, stale {}, failed {}, actions marked {}",
                        dispatch.dispatched,
                        dispatch.stale,
                        dispatch.failed(),
                        dispatch.actions_marked
                    );
                    for failure in &dispatch.failures {
                        println!("    ! case {}: {}", failure.case_id, failure.reason);
                    }
                }
            }
        }
    }
}
