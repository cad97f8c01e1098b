//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::DashboardError;
use crate::impact::ImpactInputs;
use crate::pages::{Page, PageOptions};
use crate::stats::Segment;

/// How rendered pages are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable metric cards and panels
    Text,
    /// One JSON snapshot with every requested page
    Json,
}

/// Engagement analytics dashboard: A/B test results, churn risk and business impact
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the experiment CSV (one row per user)
    #[arg(long, default_value = "data/processed/user_experiment_data_clean.csv")]
    pub experiment: PathBuf,

    /// Path to the churn predictions CSV
    #[arg(long, default_value = "data/processed/churn_predictions.csv")]
    pub predictions: PathBuf,

    /// Directory holding the static report images and trend summary
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Page to render; renders every page in navigation order when omitted
    #[arg(short, long, value_enum)]
    pub page: Option<Page>,

    /// Segment dimension for the A/B engagement breakdown
    #[arg(short, long, value_enum, default_value_t = Segment::AgeGroup)]
    pub segment: Segment,

    /// Daily active users, in millions
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u32).range(100..=1000))]
    pub dau: u32,

    /// Average revenue per user, dollars per month
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=15))]
    pub arpu: u32,

    /// Engagement lift to project, percent
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub lift: u32,

    /// Write PNG charts into this directory
    #[arg(short, long)]
    pub charts_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (same as --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validated projection inputs from the slider flags
    pub fn impact_inputs(&self) -> Result<ImpactInputs, DashboardError> {
        ImpactInputs::new(self.dau, self.arpu, self.lift)
    }

    pub fn page_options(&self) -> crate::Result<PageOptions> {
        Ok(PageOptions {
            segment: self.segment,
            impact: self.impact_inputs()?,
        })
    }

    /// Pages to render, in display order
    pub fn pages(&self) -> Vec<Page> {
        match self.page {
            Some(page) => vec![page],
            None => Page::ALL.to_vec(),
        }
    }

    /// Filter directive for the tracing subscriber
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            self.log_level.as_str()
        }
    }
}
