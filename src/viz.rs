//! Chart rendering using Plotters
//!
//! Every chart is a standalone PNG. Control is drawn in blue and treatment in
//! pink throughout so the pages read consistently.

use std::path::Path;

use plotters::prelude::*;

use crate::data::{ExperimentTable, PredictionTable, Variant};
use crate::impact::SensitivityPoint;
use crate::stats::{histogram, value_range, HistogramBin, SegmentMean, HIGH_RISK_THRESHOLD};

const CONTROL_COLOR: RGBColor = RGBColor(0x42, 0x67, 0xB2);
const TREATMENT_COLOR: RGBColor = RGBColor(0xE1, 0x30, 0x6C);

const CHART_SIZE: (u32, u32) = (800, 600);
const MINUTES_BINS: usize = 40;
const PROBABILITY_BINS: usize = 50;
const BAR_WIDTH: f64 = 0.35;

fn variant_color(variant: Variant) -> RGBColor {
    match variant {
        Variant::Control => CONTROL_COLOR,
        Variant::Treatment => TREATMENT_COLOR,
    }
}

/// Overlaid histograms of daily active minutes, one per experiment arm
pub fn create_engagement_histogram(
    table: &ExperimentTable,
    output_path: &Path,
) -> crate::Result<()> {
    let all: Vec<f64> = table
        .records()
        .iter()
        .map(|r| r.daily_active_minutes)
        .collect();
    let (min, max) = value_range(&all).unwrap_or((0.0, 1.0));
    let max = if max > min { max } else { min + 1.0 };

    let per_arm: Vec<(Variant, Vec<HistogramBin>)> = Variant::ALL
        .iter()
        .map(|&variant| {
            let values: Vec<f64> = table
                .records()
                .iter()
                .filter(|r| r.group == variant)
                .map(|r| r.daily_active_minutes)
                .collect();
            (variant, histogram(&values, MINUTES_BINS, min, max))
        })
        .collect();

    let max_count = per_arm
        .iter()
        .flat_map(|(_, bins)| bins.iter().map(|b| b.count))
        .max()
        .unwrap_or(0)
        .max(1);

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Daily Active Minutes: Control vs Treatment",
            ("sans-serif", 30),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(min..max, 0f64..(max_count as f64 * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Daily Active Minutes")
        .y_desc("Users")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (variant, bins) in &per_arm {
        let color = variant_color(*variant);
        chart
            .draw_series(bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.start, 0.0), (bin.end, bin.count as f64)],
                    color.mix(0.7).filled(),
                )
            }))?
            .label(variant.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::debug!(path = %output_path.display(), "engagement histogram written");

    Ok(())
}

/// Side-by-side bars per segment, one bar per experiment arm
///
/// `cells` must be sorted by segment, as returned by
/// [`crate::stats::segment_means`].
pub fn create_grouped_bar_chart(
    cells: &[SegmentMean],
    title: &str,
    y_desc: &str,
    output_path: &Path,
) -> crate::Result<()> {
    let mut segments: Vec<&str> = cells.iter().map(|c| c.segment.as_str()).collect();
    segments.dedup();

    let max_value = cells.iter().map(|c| c.mean).fold(0.0, f64::max);
    let y_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };
    let x_max = segments.len().max(1) as f64 - 0.5;

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..x_max, 0f64..y_max)?;

    let label_for = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() < 1e-6 && idx >= 0.0 {
            segments
                .get(idx as usize)
                .map(|s| s.to_string())
                .unwrap_or_default()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(segments.len() + 2)
        .x_label_formatter(&label_for)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for variant in Variant::ALL {
        let color = variant_color(variant);
        let offset = match variant {
            Variant::Control => -BAR_WIDTH,
            Variant::Treatment => 0.0,
        };

        let bars = cells.iter().filter(|c| c.group == variant).filter_map(|cell| {
            let idx = segments.iter().position(|s| *s == cell.segment)? as f64;
            Some(Rectangle::new(
                [(idx + offset, 0.0), (idx + offset + BAR_WIDTH, cell.mean)],
                color.filled(),
            ))
        });

        chart
            .draw_series(bars)?
            .label(variant.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::debug!(path = %output_path.display(), title, "bar chart written");

    Ok(())
}

/// Distribution of predicted churn probabilities with the high-risk cutoff
pub fn create_churn_probability_histogram(
    predictions: &PredictionTable,
    output_path: &Path,
) -> crate::Result<()> {
    let bins = histogram(predictions.probabilities(), PROBABILITY_BINS, 0.0, 1.0);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let y_max = max_count as f64 * 1.1;

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Churn Probability Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Churn Probability")
        .y_desc("Users")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            TREATMENT_COLOR.filled(),
        )
    }))?;

    chart
        .draw_series(LineSeries::new(
            vec![(HIGH_RISK_THRESHOLD, 0.0), (HIGH_RISK_THRESHOLD, y_max)],
            BLACK.stroke_width(2),
        ))?
        .label("High Risk Threshold")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::debug!(path = %output_path.display(), "churn probability histogram written");

    Ok(())
}

/// Annual revenue impact across the lift range, highlighting `selected_lift`
pub fn create_sensitivity_chart(
    curve: &[SensitivityPoint],
    selected_lift: u32,
    output_path: &Path,
) -> crate::Result<()> {
    let max_impact = curve
        .iter()
        .map(|p| p.annual_impact_millions)
        .fold(0.0, f64::max);
    let y_max = if max_impact > 0.0 { max_impact * 1.1 } else { 1.0 };
    let x_max = curve.last().map(|p| p.lift_pct).unwrap_or(1) as f64 + 0.5;

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Revenue Impact Sensitivity", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0.5f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Engagement Lift (%)")
        .y_desc("Annual Revenue Impact ($M)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(f64, f64)> = curve
        .iter()
        .map(|p| (f64::from(p.lift_pct), p.annual_impact_millions))
        .collect();

    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            TREATMENT_COLOR.stroke_width(3),
        ))?
        .label("Annual impact")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], TREATMENT_COLOR.stroke_width(3))
        });

    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 4, TREATMENT_COLOR.filled())),
    )?;

    if let Some(selected) = curve.iter().find(|p| p.lift_pct == selected_lift) {
        chart
            .draw_series(std::iter::once(Circle::new(
                (f64::from(selected.lift_pct), selected.annual_impact_millions),
                8,
                CONTROL_COLOR.filled(),
            )))?
            .label(format!("Selected lift ({}%)", selected.lift_pct))
            .legend(|(x, y)| Circle::new((x + 5, y), 5, CONTROL_COLOR.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::debug!(path = %output_path.display(), selected_lift, "sensitivity chart written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        ACCOUNT_TYPE, AGE_GROUP, CHURNED_30D, CHURN_PROBABILITY, DAILY_ACTIVE_MINUTES, GROUP,
    };
    use crate::impact::{sensitivity_curve, ImpactInputs};
    use crate::stats::churn_by_age_group;
    use polars::prelude::*;
    use tempfile::tempdir;

    fn create_test_table() -> ExperimentTable {
        let frame = df!(
            GROUP => ["control", "control", "treatment", "treatment", "treatment"],
            DAILY_ACTIVE_MINUTES => [12.0, 30.0, 28.0, 44.5, 39.0],
            CHURNED_30D => [1i64, 0, 0, 0, 1],
            AGE_GROUP => ["18-24", "25-34", "18-24", "25-34", "35-44"],
            ACCOUNT_TYPE => ["casual", "creator", "casual", "business", "creator"]
        )
        .unwrap();
        ExperimentTable::from_frame(frame).unwrap()
    }

    #[test]
    fn test_create_engagement_histogram() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("engagement.png");

        let result = create_engagement_histogram(&create_test_table(), &output_path);
        assert!(result.is_ok());
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_grouped_bar_chart() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("churn.png");
        let cells = churn_by_age_group(&create_test_table()).unwrap();

        let result =
            create_grouped_bar_chart(&cells, "Churn Rate by Age Group", "Churn Rate", &output_path);
        assert!(result.is_ok());
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_churn_probability_histogram() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("risk.png");
        let frame = df!(CHURN_PROBABILITY => [0.1, 0.45, 0.62, 0.9, 0.6]).unwrap();
        let predictions = PredictionTable::from_frame(frame).unwrap();

        let result = create_churn_probability_histogram(&predictions, &output_path);
        assert!(result.is_ok());
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_sensitivity_chart() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("sensitivity.png");
        let curve = sensitivity_curve(&ImpactInputs::new(200, 4, 12).unwrap());

        let result = create_sensitivity_chart(&curve, 12, &output_path);
        assert!(result.is_ok());
        assert!(output_path.exists());
    }
}
