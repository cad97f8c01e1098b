//! Dataset loading and validation using Polars
//!
//! Both tables are read once, checked against their invariants and then only
//! ever borrowed. Report artifacts (images and the trend summary) are resolved
//! lazily because only some pages need them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use polars::prelude::*;
use serde::Serialize;

use crate::error::DashboardError;

/// Experiment arm column
pub const GROUP: &str = "group";
/// Engagement metric column
pub const DAILY_ACTIVE_MINUTES: &str = "daily_active_minutes";
/// 30-day churn flag column
pub const CHURNED_30D: &str = "churned_30d";
/// Age bucket column
pub const AGE_GROUP: &str = "age_group";
/// Account type column
pub const ACCOUNT_TYPE: &str = "account_type";
/// Predicted churn probability column
pub const CHURN_PROBABILITY: &str = "churn_probability";

const EXPERIMENT_TABLE: &str = "experiment";
const PREDICTION_TABLE: &str = "predictions";

/// Arm of the A/B experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Control,
    Treatment,
}

impl Variant {
    /// Both arms, control first
    pub const ALL: [Variant; 2] = [Variant::Control, Variant::Treatment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Control => "control",
            Variant::Treatment => "treatment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "control" => Some(Variant::Control),
            "treatment" => Some(Variant::Treatment),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user in the A/B experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentRecord {
    pub group: Variant,
    pub daily_active_minutes: f64,
    pub churned_30d: bool,
    pub age_group: String,
    pub account_type: String,
}

/// Validated experiment table
#[derive(Debug, Clone)]
pub struct ExperimentTable {
    frame: DataFrame,
    records: Vec<ExperimentRecord>,
}

impl ExperimentTable {
    /// Validate a raw frame and build the typed view over it
    ///
    /// The stored frame is rebuilt from the validated records, so aggregation
    /// always sees `group` as text and `churned_30d` as 0.0/1.0 regardless of
    /// how the CSV spelled them.
    pub fn from_frame(raw: DataFrame) -> crate::Result<Self> {
        if raw.height() == 0 {
            return Err(DashboardError::EmptyTable {
                table: EXPERIMENT_TABLE,
            }
            .into());
        }

        let groups = string_column(&raw, EXPERIMENT_TABLE, GROUP)?;
        let minutes = f64_column(&raw, EXPERIMENT_TABLE, DAILY_ACTIVE_MINUTES)?;
        let churned = flag_column(&raw, EXPERIMENT_TABLE, CHURNED_30D)?;
        let age_groups = string_column(&raw, EXPERIMENT_TABLE, AGE_GROUP)?;
        let account_types = string_column(&raw, EXPERIMENT_TABLE, ACCOUNT_TYPE)?;

        let mut records = Vec::with_capacity(raw.height());
        let rows = groups
            .into_iter()
            .zip(minutes)
            .zip(churned)
            .zip(age_groups.into_iter().zip(account_types));

        for (row, (((group, minutes), churned_30d), (age_group, account_type))) in rows.enumerate()
        {
            let group = Variant::parse(&group).ok_or_else(|| DashboardError::InvalidRow {
                table: EXPERIMENT_TABLE,
                row,
                message: format!("unknown group `{group}`"),
            })?;

            if !minutes.is_finite() || minutes < 0.0 {
                return Err(DashboardError::InvalidRow {
                    table: EXPERIMENT_TABLE,
                    row,
                    message: format!("{DAILY_ACTIVE_MINUTES} must be non-negative, got {minutes}"),
                }
                .into());
            }

            records.push(ExperimentRecord {
                group,
                daily_active_minutes: minutes,
                churned_30d,
                age_group,
                account_type,
            });
        }

        let groups: Vec<&str> = records.iter().map(|r| r.group.as_str()).collect();
        let minutes: Vec<f64> = records.iter().map(|r| r.daily_active_minutes).collect();
        let churned: Vec<f64> = records
            .iter()
            .map(|r| if r.churned_30d { 1.0 } else { 0.0 })
            .collect();
        let age_groups: Vec<&str> = records.iter().map(|r| r.age_group.as_str()).collect();
        let account_types: Vec<&str> = records.iter().map(|r| r.account_type.as_str()).collect();

        let frame = df!(
            GROUP => groups,
            DAILY_ACTIVE_MINUTES => minutes,
            CHURNED_30D => churned,
            AGE_GROUP => age_groups,
            ACCOUNT_TYPE => account_types
        )?;

        Ok(Self { frame, records })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn records(&self) -> &[ExperimentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validated churn prediction table; only the probability column is kept
#[derive(Debug, Clone)]
pub struct PredictionTable {
    probabilities: Vec<f64>,
}

impl PredictionTable {
    pub fn from_frame(frame: DataFrame) -> crate::Result<Self> {
        if frame.height() == 0 {
            return Err(DashboardError::EmptyTable {
                table: PREDICTION_TABLE,
            }
            .into());
        }

        let probabilities = f64_column(&frame, PREDICTION_TABLE, CHURN_PROBABILITY)?;
        if let Some((row, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(DashboardError::InvalidRow {
                table: PREDICTION_TABLE,
                row,
                message: format!("{CHURN_PROBABILITY} must be within [0, 1], got {p}"),
            }
            .into());
        }

        Ok(Self { probabilities })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Both tables, loaded once per run
#[derive(Debug, Clone)]
pub struct Datasets {
    pub experiment: ExperimentTable,
    pub predictions: PredictionTable,
}

/// Load and validate the experiment and prediction CSV files
///
/// # Arguments
/// * `experiment_path` - CSV with one row per experiment participant
/// * `predictions_path` - CSV with a `churn_probability` column
pub fn load_datasets(experiment_path: &Path, predictions_path: &Path) -> crate::Result<Datasets> {
    let experiment = ExperimentTable::from_frame(read_csv(experiment_path)?)
        .with_context(|| format!("invalid experiment data in {}", experiment_path.display()))?;
    let predictions = PredictionTable::from_frame(read_csv(predictions_path)?)
        .with_context(|| format!("invalid predictions in {}", predictions_path.display()))?;

    tracing::info!(
        experiment_rows = experiment.len(),
        prediction_rows = predictions.len(),
        "datasets loaded"
    );

    Ok(Datasets {
        experiment,
        predictions,
    })
}

/// Read a CSV file with a header row into a DataFrame
pub fn read_csv(path: &Path) -> crate::Result<DataFrame> {
    if !path.is_file() {
        return Err(DashboardError::MissingInput(path.to_path_buf()).into());
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("failed to parse CSV {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        rows = frame.height(),
        cols = frame.width(),
        "read CSV"
    );

    Ok(frame)
}

/// Extract a numeric column as `f64`, rejecting nulls
pub(crate) fn f64_column(
    frame: &DataFrame,
    table: &'static str,
    name: &str,
) -> crate::Result<Vec<f64>> {
    let raw = frame.column(name)?.as_materialized_series();
    let series = raw.cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(value) => Ok(value),
            // Non-numeric text casts to null; tell it apart from a real gap
            None => match raw.get(row)? {
                AnyValue::Null => Err(missing_value(table, row, name)),
                other => {
                    let text = other
                        .get_str()
                        .map(str::to_owned)
                        .unwrap_or_else(|| other.to_string());
                    Err(not_a_number(table, row, name, &text))
                }
            },
        })
        .collect()
}

/// Extract a categorical column as owned strings, rejecting nulls
pub(crate) fn string_column(
    frame: &DataFrame,
    table: &'static str,
    name: &str,
) -> crate::Result<Vec<String>> {
    let series = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;

    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .map(str::to_owned)
                .ok_or_else(|| missing_value(table, row, name))
        })
        .collect()
}

/// Extract a 0/1 flag column; accepts booleans, integers and `true`/`false` text
fn flag_column(frame: &DataFrame, table: &'static str, name: &str) -> crate::Result<Vec<bool>> {
    let series = frame.column(name)?.as_materialized_series();

    match series.dtype() {
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| value.ok_or_else(|| missing_value(table, row, name)))
            .collect(),
        DataType::String => string_column(frame, table, name)?
            .iter()
            .enumerate()
            .map(|(row, value)| match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(not_a_flag(table, row, name, other)),
            })
            .collect(),
        _ => f64_column(frame, table, name)?
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                if value == 1.0 {
                    Ok(true)
                } else if value == 0.0 {
                    Ok(false)
                } else {
                    Err(not_a_flag(table, row, name, &value.to_string()))
                }
            })
            .collect(),
    }
}

fn missing_value(table: &'static str, row: usize, column: &str) -> anyhow::Error {
    DashboardError::InvalidRow {
        table,
        row,
        message: format!("missing value in `{column}`"),
    }
    .into()
}

fn not_a_number(table: &'static str, row: usize, column: &str, value: &str) -> anyhow::Error {
    DashboardError::InvalidRow {
        table,
        row,
        message: format!("`{column}` must be numeric, got `{value}`"),
    }
    .into()
}

fn not_a_flag(table: &'static str, row: usize, column: &str, value: &str) -> anyhow::Error {
    DashboardError::InvalidRow {
        table,
        row,
        message: format!("`{column}` must be 0 or 1, got `{value}`"),
    }
    .into()
}

/// Static report artifacts produced by the offline analysis notebooks
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    dir: PathBuf,
}

impl ReportArtifacts {
    pub const SHAP_IMPORTANCE: &'static str = "shap_importance_bar.png";
    pub const SENTIMENT: &'static str = "nlp_sentiment.png";
    pub const WEEKLY_SUMMARY: &'static str = "weekly_trend_summary.txt";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// SHAP feature-importance bar chart
    pub fn shap_importance(&self) -> crate::Result<PathBuf> {
        self.existing(Self::SHAP_IMPORTANCE)
    }

    /// Sentiment-by-feed-type chart
    pub fn sentiment(&self) -> crate::Result<PathBuf> {
        self.existing(Self::SENTIMENT)
    }

    /// Contents of the weekly trend summary
    pub fn weekly_summary(&self) -> crate::Result<String> {
        let path = self.existing(Self::WEEKLY_SUMMARY)?;
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
    }

    fn existing(&self, file_name: &str) -> crate::Result<PathBuf> {
        let path = self.dir.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            tracing::warn!(path = %path.display(), "report artifact missing");
            Err(DashboardError::MissingArtifact(path).into())
        }
    }
}
