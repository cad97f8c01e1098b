//! Descriptive statistics over the experiment and prediction tables

use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;

use crate::data::{
    f64_column, string_column, ExperimentTable, PredictionTable, Variant, ACCOUNT_TYPE, AGE_GROUP,
    CHURNED_30D, DAILY_ACTIVE_MINUTES, GROUP,
};

/// Users with a churn probability strictly above this are "high risk"
pub const HIGH_RISK_THRESHOLD: f64 = 0.6;

const AGGREGATE: &str = "aggregate";
const MEAN: &str = "mean";

/// Dimension used to break down A/B engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    #[default]
    AgeGroup,
    AccountType,
}

impl Segment {
    pub fn column(&self) -> &'static str {
        match self {
            Segment::AgeGroup => AGE_GROUP,
            Segment::AccountType => ACCOUNT_TYPE,
        }
    }
}

/// Headline numbers for the whole experiment population
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverviewStats {
    pub total_users: usize,
    /// Fraction of users churned within 30 days
    pub churn_rate: f64,
    pub avg_daily_active_minutes: f64,
}

pub fn overview(table: &ExperimentTable) -> crate::Result<OverviewStats> {
    let out = table
        .frame()
        .clone()
        .lazy()
        .select([col(CHURNED_30D).mean(), col(DAILY_ACTIVE_MINUTES).mean()])
        .collect()?;

    let churn_rate = f64_column(&out, AGGREGATE, CHURNED_30D)?;
    let minutes = f64_column(&out, AGGREGATE, DAILY_ACTIVE_MINUTES)?;

    Ok(OverviewStats {
        total_users: table.len(),
        churn_rate: churn_rate.first().copied().unwrap_or(0.0),
        avg_daily_active_minutes: minutes.first().copied().unwrap_or(0.0),
    })
}

/// Relative change of treatment over control, in percent
///
/// Serializes as the bare percentage, or the string `"undefined"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lift {
    Defined(f64),
    /// Control mean is zero or one of the arms has no users
    Undefined,
}

impl Lift {
    pub fn between(control_mean: Option<f64>, treatment_mean: Option<f64>) -> Self {
        match (control_mean, treatment_mean) {
            (Some(control), Some(treatment)) if control != 0.0 => {
                Lift::Defined((treatment - control) / control * 100.0)
            }
            _ => Lift::Undefined,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Lift::Defined(pct) => Some(*pct),
            Lift::Undefined => None,
        }
    }
}

impl Serialize for Lift {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Lift::Defined(pct) => serializer.serialize_f64(*pct),
            Lift::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl std::fmt::Display for Lift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lift::Defined(pct) => write!(f, "{pct:+.1}%"),
            Lift::Undefined => f.write_str("undefined"),
        }
    }
}

/// Per-arm mean of one column; `None` when the arm has no rows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroupMeans {
    pub control: Option<f64>,
    pub treatment: Option<f64>,
}

impl GroupMeans {
    pub fn get(&self, variant: Variant) -> Option<f64> {
        match variant {
            Variant::Control => self.control,
            Variant::Treatment => self.treatment,
        }
    }

    pub fn lift(&self) -> Lift {
        Lift::between(self.control, self.treatment)
    }
}

/// Engagement comparison between the two arms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AbTestSummary {
    pub daily_active_minutes: GroupMeans,
    pub lift: Lift,
}

pub fn ab_test_summary(table: &ExperimentTable) -> crate::Result<AbTestSummary> {
    let daily_active_minutes = group_means(table, DAILY_ACTIVE_MINUTES)?;
    let lift = daily_active_minutes.lift();

    if lift == Lift::Undefined {
        tracing::warn!(?daily_active_minutes, "engagement lift is undefined");
    }

    Ok(AbTestSummary {
        daily_active_minutes,
        lift,
    })
}

/// Mean of `value_column` for each experiment arm
pub fn group_means(table: &ExperimentTable, value_column: &str) -> crate::Result<GroupMeans> {
    let out = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(GROUP)])
        .agg([col(value_column).mean().alias(MEAN)])
        .collect()?;

    let groups = string_column(&out, AGGREGATE, GROUP)?;
    let means = f64_column(&out, AGGREGATE, MEAN)?;

    let mut result = GroupMeans::default();
    for (group, mean) in groups.iter().zip(means) {
        match Variant::parse(group) {
            Some(Variant::Control) => result.control = Some(mean),
            Some(Variant::Treatment) => result.treatment = Some(mean),
            None => {}
        }
    }

    Ok(result)
}

/// Mean of a value within one (segment, arm) cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentMean {
    pub segment: String,
    pub group: Variant,
    pub mean: f64,
}

/// Mean of `value_column` grouped by `segment_column` and arm, sorted by
/// segment then arm
pub fn segment_means(
    table: &ExperimentTable,
    segment_column: &str,
    value_column: &str,
) -> crate::Result<Vec<SegmentMean>> {
    let out = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(segment_column), col(GROUP)])
        .agg([col(value_column).mean().alias(MEAN)])
        .collect()?;

    let segments = string_column(&out, AGGREGATE, segment_column)?;
    let groups = string_column(&out, AGGREGATE, GROUP)?;
    let means = f64_column(&out, AGGREGATE, MEAN)?;

    let mut cells: Vec<SegmentMean> = segments
        .into_iter()
        .zip(groups)
        .zip(means)
        .filter_map(|((segment, group), mean)| {
            Variant::parse(&group).map(|group| SegmentMean {
                segment,
                group,
                mean,
            })
        })
        .collect();

    cells.sort_by(|a, b| a.segment.cmp(&b.segment).then(a.group.cmp(&b.group)));

    tracing::debug!(
        segment = segment_column,
        value = value_column,
        cells = cells.len(),
        "computed segment means"
    );

    Ok(cells)
}

/// Churn rate by age group and arm
pub fn churn_by_age_group(table: &ExperimentTable) -> crate::Result<Vec<SegmentMean>> {
    segment_means(table, AGE_GROUP, CHURNED_30D)
}

/// Mean daily active minutes by the chosen segment and arm
pub fn engagement_by_segment(
    table: &ExperimentTable,
    segment: Segment,
) -> crate::Result<Vec<SegmentMean>> {
    segment_means(table, segment.column(), DAILY_ACTIVE_MINUTES)
}

/// Size of the high-risk population
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskSummary {
    pub high_risk_users: usize,
    pub total_users: usize,
    /// `high_risk_users / total_users`
    pub high_risk_share: f64,
}

/// Number of probabilities strictly above [`HIGH_RISK_THRESHOLD`]
pub fn high_risk_count(probabilities: &[f64]) -> usize {
    probabilities
        .iter()
        .filter(|&&p| p > HIGH_RISK_THRESHOLD)
        .count()
}

pub fn risk_summary(predictions: &PredictionTable) -> RiskSummary {
    let high_risk_users = high_risk_count(predictions.probabilities());
    let total_users = predictions.len();

    RiskSummary {
        high_risk_users,
        total_users,
        high_risk_share: high_risk_users as f64 / total_users.max(1) as f64,
    }
}

/// One histogram bucket covering `[start, end)`; the last bucket also
/// includes `end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bucket `values` into `bins` equal-width bins over `[min, max]`
///
/// Values outside the range (and NaN) are ignored. A degenerate range is
/// widened to one unit so constant data still lands in a bin.
pub fn histogram(values: &[f64], bins: usize, min: f64, max: f64) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let max = if max > min { max } else { min + 1.0 };
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        if !(min..=max).contains(&v) {
            continue;
        }
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Smallest and largest finite value, if any
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn create_test_table() -> ExperimentTable {
        let frame = df!(
            GROUP => ["control", "control", "control", "treatment", "treatment"],
            DAILY_ACTIVE_MINUTES => [10.0, 20.0, 30.0, 25.0, 35.0],
            CHURNED_30D => [1i64, 0, 0, 0, 1],
            AGE_GROUP => ["18-24", "25-34", "25-34", "18-24", "25-34"],
            ACCOUNT_TYPE => ["casual", "casual", "creator", "creator", "creator"]
        )
        .unwrap();

        ExperimentTable::from_frame(frame).unwrap()
    }

    #[test]
    fn test_overview() {
        let stats = overview(&create_test_table()).unwrap();

        assert_eq!(stats.total_users, 5);
        assert!(approx_eq(stats.churn_rate, 0.4));
        assert!(approx_eq(stats.avg_daily_active_minutes, 24.0));
    }

    #[test]
    fn test_group_means() {
        let means = group_means(&create_test_table(), DAILY_ACTIVE_MINUTES).unwrap();

        assert!(approx_eq(means.control.unwrap(), 20.0));
        assert!(approx_eq(means.treatment.unwrap(), 30.0));
    }

    #[test]
    fn test_ab_test_lift() {
        let summary = ab_test_summary(&create_test_table()).unwrap();

        assert!(approx_eq(summary.lift.value().unwrap(), 50.0));
        assert_eq!(summary.lift.to_string(), "+50.0%");
    }

    #[test]
    fn test_lift_undefined_for_zero_control() {
        assert_eq!(Lift::between(Some(0.0), Some(12.0)), Lift::Undefined);
        assert_eq!(Lift::between(None, Some(12.0)), Lift::Undefined);
        assert_eq!(Lift::between(Some(10.0), None), Lift::Undefined);
        assert_eq!(Lift::Undefined.to_string(), "undefined");
        assert_eq!(Lift::between(Some(20.0), Some(15.0)).to_string(), "-25.0%");
    }

    #[test]
    fn test_lift_serializes_as_number_or_undefined() {
        assert_eq!(serde_json::to_value(Lift::Defined(20.0)).unwrap(), serde_json::json!(20.0));
        assert_eq!(serde_json::to_value(Lift::Undefined).unwrap(), serde_json::json!("undefined"));

        let summary = ab_test_summary(&create_test_table()).unwrap();
        let json = serde_json::to_value(summary).unwrap();
        assert!(json["lift"].is_f64());
    }

    #[test]
    fn test_lift_with_missing_arm() {
        let frame = df!(
            GROUP => ["control", "control"],
            DAILY_ACTIVE_MINUTES => [0.0, 0.0],
            CHURNED_30D => [0i64, 0],
            AGE_GROUP => ["18-24", "18-24"],
            ACCOUNT_TYPE => ["casual", "casual"]
        )
        .unwrap();
        let table = ExperimentTable::from_frame(frame).unwrap();

        let summary = ab_test_summary(&table).unwrap();
        assert_eq!(summary.daily_active_minutes.treatment, None);
        assert_eq!(summary.lift, Lift::Undefined);
    }

    #[test]
    fn test_churn_by_age_group() {
        let cells = churn_by_age_group(&create_test_table()).unwrap();

        let rates: Vec<(&str, Variant, f64)> = cells
            .iter()
            .map(|c| (c.segment.as_str(), c.group, c.mean))
            .collect();
        assert_eq!(
            rates,
            vec![
                ("18-24", Variant::Control, 1.0),
                ("18-24", Variant::Treatment, 0.0),
                ("25-34", Variant::Control, 0.0),
                ("25-34", Variant::Treatment, 1.0),
            ]
        );
    }

    #[test]
    fn test_engagement_by_account_type() {
        let cells = engagement_by_segment(&create_test_table(), Segment::AccountType).unwrap();

        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].segment, "casual");
        assert!(approx_eq(cells[0].mean, 15.0));
        assert_eq!(cells[1].segment, "creator");
        assert_eq!(cells[1].group, Variant::Control);
        assert!(approx_eq(cells[1].mean, 30.0));
        assert_eq!(cells[2].group, Variant::Treatment);
        assert!(approx_eq(cells[2].mean, 30.0));
    }

    #[test]
    fn test_high_risk_count() {
        let probabilities = [0.05, 0.6, 0.61, 0.99, 0.3, 0.600001, 1.0, 0.59];
        assert_eq!(high_risk_count(&probabilities), 4);
        assert_eq!(high_risk_count(&[]), 0);
    }

    #[test]
    fn test_histogram() {
        let values = [0.0, 0.1, 0.25, 0.5, 0.99, 1.0, 1.5];
        let bins = histogram(&values, 4, 0.0, 1.0);

        assert_eq!(bins.len(), 4);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 2]);
        assert!(approx_eq(bins[1].start, 0.25));
        assert!(approx_eq(bins[3].end, 1.0));
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let bins = histogram(&[5.0, 5.0], 3, 5.0, 5.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_value_range() {
        assert_eq!(value_range(&[3.0, -1.0, f64::NAN, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(value_range(&[]), None);
    }
}
