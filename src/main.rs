//! Engagement Intel: renders the experiment dashboard pages from the command line
//!
//! Loads both datasets once, renders the requested pages and prints them as
//! text or as a JSON snapshot. Logs go to stderr so JSON output stays clean.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use engagement_intel::{load_datasets, Args, Dashboard, OutputFormat, ReportArtifacts, Snapshot};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_filter())?;

    let options = args.page_options()?;
    let pages = args.pages();

    let start_time = Instant::now();

    tracing::info!(
        experiment = %args.experiment.display(),
        predictions = %args.predictions.display(),
        "loading datasets"
    );
    let datasets = load_datasets(&args.experiment, &args.predictions)?;

    let dashboard = Dashboard::new(
        datasets,
        ReportArtifacts::new(&args.reports_dir),
        args.charts_dir.clone(),
    );
    let snapshot = Snapshot::new(dashboard.render_all(&pages, &options));

    match args.format {
        OutputFormat::Text => {
            println!(
                "Generated at {}\n",
                snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            for report in &snapshot.pages {
                println!("{report}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    let failed = snapshot.failures();
    tracing::info!(
        pages = snapshot.pages.len(),
        failed,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "dashboard rendered"
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {} pages failed to render", snapshot.pages.len());
    }

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();

    Ok(())
}
