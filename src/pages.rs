//! Dashboard pages
//!
//! Each page turns the loaded tables into a [`PageReport`]: metric cards,
//! callouts, an optional text panel and references to charts and images.
//! Reports print as plain text or serialize to JSON.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::data::{Datasets, ReportArtifacts, Variant};
use crate::impact::{project, sensitivity_curve, ImpactInputs, CHURN_REDUCTION, REVENUE_CORRELATION};
use crate::stats::{self, Segment};
use crate::viz;

const EXPERIMENT_DURATION: &str = "4 Weeks";
const SIGNIFICANCE: &str = "p < 0.001";
const MODEL_AUC: &str = "0.84";

/// Views in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Overview,
    AbTest,
    ChurnRisk,
    Content,
    Recommendation,
    Impact,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Overview,
        Page::AbTest,
        Page::ChurnRisk,
        Page::Content,
        Page::Recommendation,
        Page::Impact,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Overview => "Social Engagement Intelligence Platform",
            Page::AbTest => "A/B Test Results: AI Feed vs Chronological Feed",
            Page::ChurnRisk => "Churn Risk Monitor",
            Page::Content => "Content Intelligence: NLP Insights",
            Page::Recommendation => "Product Recommendation",
            Page::Impact => "Business Impact Projection",
        }
    }
}

/// A single headline number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl Metric {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            delta: None,
        }
    }

    fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Error,
    Info,
}

impl Tone {
    fn tag(&self) -> &'static str {
        match self {
            Tone::Success => "[SHIP]",
            Tone::Warning => "[HOLD]",
            Tone::Error => "[STOP]",
            Tone::Info => "[INFO]",
        }
    }
}

/// Highlighted message box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callout {
    pub tone: Tone,
    pub text: String,
}

impl Callout {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

/// A rendered chart or a static image with its caption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub path: PathBuf,
    pub caption: String,
}

/// Everything one page displays
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: Page,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub metrics: Vec<Metric>,
    pub callouts: Vec<Callout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub charts: Vec<Figure>,
    pub images: Vec<Figure>,
    /// Raw numbers behind the cards
    pub data: serde_json::Value,
    /// Why the page could not be rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageReport {
    fn new(page: Page) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            subtitle: None,
            metrics: Vec::new(),
            callouts: Vec::new(),
            text: None,
            charts: Vec::new(),
            images: Vec::new(),
            data: serde_json::Value::Null,
            error: None,
        }
    }

    /// Placeholder for a page whose inputs were unavailable
    pub fn failed(page: Page, err: &anyhow::Error) -> Self {
        let mut report = Self::new(page);
        report.error = Some(format!("{err:#}"));
        report
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Look up a metric card by label
    pub fn metric(&self, label: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.label == label)
    }
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.title)?;
        if let Some(subtitle) = &self.subtitle {
            writeln!(f, "{subtitle}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "[ERROR] page could not be rendered: {error}")?;
        }

        if !self.metrics.is_empty() {
            writeln!(f)?;
            let width = self.metrics.iter().map(|m| m.label.len()).max().unwrap_or(0);
            for metric in &self.metrics {
                write!(f, "  {:<width$}  {}", metric.label, metric.value)?;
                if let Some(delta) = &metric.delta {
                    write!(f, " ({delta})")?;
                }
                writeln!(f)?;
            }
        }

        if !self.callouts.is_empty() {
            writeln!(f)?;
            for callout in &self.callouts {
                writeln!(f, "{} {}", callout.tone.tag(), callout.text)?;
            }
        }

        if let Some(text) = &self.text {
            writeln!(f)?;
            writeln!(f, "{}", text.trim_end())?;
        }

        if !self.charts.is_empty() || !self.images.is_empty() {
            writeln!(f)?;
            for chart in &self.charts {
                writeln!(f, "  Chart: {} ({})", chart.path.display(), chart.caption)?;
            }
            for image in &self.images {
                writeln!(f, "  Image: {} ({})", image.path.display(), image.caption)?;
            }
        }

        Ok(())
    }
}

/// Output of one run: the requested pages and when they were rendered
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<PageReport>,
}

impl Snapshot {
    pub fn new(pages: Vec<PageReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            pages,
        }
    }

    /// Number of pages that failed to render
    pub fn failures(&self) -> usize {
        self.pages.iter().filter(|p| p.is_failed()).count()
    }
}

/// User-adjustable inputs shared by all pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOptions {
    pub segment: Segment,
    pub impact: ImpactInputs,
}

/// Loaded tables plus where to find and write figures
#[derive(Debug)]
pub struct Dashboard {
    datasets: Datasets,
    artifacts: ReportArtifacts,
    charts_dir: Option<PathBuf>,
}

impl Dashboard {
    /// `charts_dir` enables PNG chart output; without it pages carry no charts
    pub fn new(datasets: Datasets, artifacts: ReportArtifacts, charts_dir: Option<PathBuf>) -> Self {
        Self {
            datasets,
            artifacts,
            charts_dir,
        }
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    pub fn render(&self, page: Page, options: &PageOptions) -> crate::Result<PageReport> {
        tracing::debug!(?page, "rendering page");

        let report = match page {
            Page::Overview => self.overview()?,
            Page::AbTest => self.ab_test(options.segment)?,
            Page::ChurnRisk => self.churn_risk()?,
            Page::Content => self.content()?,
            Page::Recommendation => recommendation(),
            Page::Impact => self.impact(&options.impact)?,
        };

        tracing::info!(
            ?page,
            metrics = report.metrics.len(),
            charts = report.charts.len(),
            "page rendered"
        );

        Ok(report)
    }

    /// Render `pages` in order
    ///
    /// A page that fails is logged and kept as a [`PageReport::failed`]
    /// entry; the remaining pages still render.
    pub fn render_all(&self, pages: &[Page], options: &PageOptions) -> Vec<PageReport> {
        pages
            .iter()
            .map(|&page| {
                self.render(page, options).unwrap_or_else(|err| {
                    tracing::error!(?page, error = %format!("{err:#}"), "page failed to render");
                    PageReport::failed(page, &err)
                })
            })
            .collect()
    }

    fn overview(&self) -> crate::Result<PageReport> {
        let experiment = &self.datasets.experiment;
        let overview = stats::overview(experiment)?;
        let churn_cells = stats::churn_by_age_group(experiment)?;

        let mut report = PageReport::new(Page::Overview);
        report.subtitle = Some("Product analytics for the AI-curated feed experiment".to_string());
        report.metrics = vec![
            Metric::new("Total Users", format_count(overview.total_users)),
            Metric::new("Experiment Duration", EXPERIMENT_DURATION),
            Metric::new("Overall Churn Rate", format_percent(overview.churn_rate)),
            Metric::new(
                "Avg Daily Active Minutes",
                format!("{:.1}", overview.avg_daily_active_minutes),
            ),
        ];

        if let Some(figure) = self.chart(
            "engagement_histogram.png",
            "Daily Active Minutes: Control vs Treatment",
            |path| viz::create_engagement_histogram(experiment, path),
        )? {
            report.charts.push(figure);
        }
        if let Some(figure) = self.chart(
            "churn_by_age_group.png",
            "Churn Rate by Age Group & Feed Type",
            |path| {
                viz::create_grouped_bar_chart(
                    &churn_cells,
                    "Churn Rate by Age Group & Feed Type",
                    "Churn Rate",
                    path,
                )
            },
        )? {
            report.charts.push(figure);
        }

        report.data = serde_json::json!({
            "overview": overview,
            "churn_by_age_group": churn_cells,
        });

        Ok(report)
    }

    fn ab_test(&self, segment: Segment) -> crate::Result<PageReport> {
        let experiment = &self.datasets.experiment;
        let summary = stats::ab_test_summary(experiment)?;
        let cells = stats::engagement_by_segment(experiment, segment)?;
        let means = summary.daily_active_minutes;

        let mut report = PageReport::new(Page::AbTest);
        report.subtitle = Some(format!("Segment: {}", segment.column()));
        report.metrics = vec![
            Metric::new("Control Avg", format_minutes(means.get(Variant::Control))),
            Metric::new("Treatment Avg", format_minutes(means.get(Variant::Treatment)))
                .with_delta(summary.lift.to_string()),
            Metric::new("Statistical Significance", SIGNIFICANCE),
        ];

        let title = format!("Engagement by {}", segment.column());
        let file_name = format!("engagement_by_{}.png", segment.column());
        if let Some(figure) = self.chart(&file_name, &title, |path| {
            viz::create_grouped_bar_chart(&cells, &title, "Daily Active Minutes", path)
        })? {
            report.charts.push(figure);
        }

        report.data = serde_json::json!({
            "summary": summary,
            "segment": segment,
            "engagement_by_segment": cells,
        });

        Ok(report)
    }

    fn churn_risk(&self) -> crate::Result<PageReport> {
        let predictions = &self.datasets.predictions;
        let risk = stats::risk_summary(predictions);
        let shap = self.artifacts.shap_importance()?;

        let mut report = PageReport::new(Page::ChurnRisk);
        report.metrics = vec![
            Metric::new("Model AUC", MODEL_AUC),
            Metric::new("High Risk Users", format_count(risk.high_risk_users))
                .with_delta(format!("{} of users", format_percent(risk.high_risk_share))),
        ];

        if let Some(figure) = self.chart(
            "churn_probability.png",
            "Churn Probability Distribution",
            |path| viz::create_churn_probability_histogram(predictions, path),
        )? {
            report.charts.push(figure);
        }
        report.images.push(Figure {
            path: shap,
            caption: "SHAP Feature Importance".to_string(),
        });

        report.data = serde_json::to_value(risk)?;

        Ok(report)
    }

    fn content(&self) -> crate::Result<PageReport> {
        let sentiment = self.artifacts.sentiment()?;
        let summary = self.artifacts.weekly_summary()?;

        let mut report = PageReport::new(Page::Content);
        report.subtitle = Some("AI-Generated Weekly Trend Summary".to_string());
        report.images.push(Figure {
            path: sentiment,
            caption: "Sentiment Analysis by Feed Type".to_string(),
        });
        report.text = Some(summary);

        Ok(report)
    }

    fn impact(&self, inputs: &ImpactInputs) -> crate::Result<PageReport> {
        let projection = project(inputs);
        let curve = sensitivity_curve(inputs);

        let mut report = PageReport::new(Page::Impact);
        report.subtitle = Some(format!(
            "DAU {}M, ARPU ${}/month, engagement lift {}%",
            inputs.dau_millions(),
            inputs.arpu(),
            inputs.lift_pct()
        ));
        report.metrics = vec![
            Metric::new(
                "Incremental Engaged Users",
                format!("{:.1}M", projection.incremental_engaged_users),
            ),
            Metric::new(
                "Monthly Revenue Impact",
                format_dollars(projection.monthly_revenue_impact),
            ),
            Metric::new(
                "Annual Revenue Impact",
                format_dollars(projection.annual_revenue_impact),
            ),
            Metric::new("Avg LTV", format!("${:.0}", projection.avg_ltv)),
            Metric::new("Churn Savings", format_dollars(projection.churn_savings)),
            Metric::new(
                "Total Annual Impact",
                format_dollars(projection.total_annual_impact),
            ),
        ];
        report.callouts.push(Callout::new(
            Tone::Info,
            format!(
                "Assumes {:.0}% of incremental engagement converts to revenue and a {:.0}% churn reduction.",
                REVENUE_CORRELATION * 100.0,
                CHURN_REDUCTION * 100.0
            ),
        ));

        let mut table = String::from("Lift  Annual impact\n");
        for point in &curve {
            let marker = if point.lift_pct == inputs.lift_pct() { " <" } else { "" };
            table.push_str(&format!(
                "{:>3}%  ${:.1}M{}\n",
                point.lift_pct, point.annual_impact_millions, marker
            ));
        }
        report.text = Some(table);

        if let Some(figure) = self.chart(
            "impact_sensitivity.png",
            "Revenue Impact Sensitivity",
            |path| viz::create_sensitivity_chart(&curve, inputs.lift_pct(), path),
        )? {
            report.charts.push(figure);
        }

        report.data = serde_json::json!({
            "projection": projection,
            "sensitivity": curve,
        });

        Ok(report)
    }

    /// Draw a chart into the charts directory, if one is configured
    fn chart<F>(&self, file_name: &str, caption: &str, draw: F) -> crate::Result<Option<Figure>>
    where
        F: FnOnce(&Path) -> crate::Result<()>,
    {
        let Some(dir) = &self.charts_dir else {
            return Ok(None);
        };

        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create charts directory {}", dir.display()))?;
        let path = dir.join(file_name);
        draw(&path).with_context(|| format!("failed to render {}", path.display()))?;

        Ok(Some(Figure {
            path,
            caption: caption.to_string(),
        }))
    }
}

fn recommendation() -> PageReport {
    let mut report = PageReport::new(Page::Recommendation);
    report.callouts = vec![
        Callout::new(Tone::Success, "SHIP AI feed to 25-34 and 35-44 age segments"),
        Callout::new(Tone::Warning, "HOLD 18-24 casual users: run follow-up experiment"),
        Callout::new(
            Tone::Error,
            "DO NOT SHIP to 18-24 casual users without re-engagement nudge",
        ),
    ];
    report.text = Some(
        "Summary\n\
         The AI-curated feed drove a statistically significant lift in engagement,\n\
         but a segmented rollout is recommended based on churn risk patterns in\n\
         younger casual users.\n\
         \n\
         Expected 90-day impact if recommendation followed:\n\
         - +8% DAU lift across 25-34 and 35-44 segments\n\
         - -3% reduction in overall churn rate\n\
         - Neutral impact on 18-24 segment pending follow-up test\n"
            .to_string(),
    );
    report
}

/// `1234567` -> `1,234,567`
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fraction as a percentage with one decimal: `0.1234` -> `12.3%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Dollars in millions, or billions from $1B up
pub fn format_dollars(amount: f64) -> String {
    if amount.abs() >= 1e9 {
        format!("${:.2}B", amount / 1e9)
    } else {
        format!("${:.1}M", amount / 1e6)
    }
}

fn format_minutes(mean: Option<f64>) -> String {
    match mean {
        Some(m) => format!("{m:.1} min"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        ExperimentTable, PredictionTable, ACCOUNT_TYPE, AGE_GROUP, CHURNED_30D, CHURN_PROBABILITY,
        DAILY_ACTIVE_MINUTES, GROUP,
    };
    use crate::error::DashboardError;
    use polars::prelude::*;
    use tempfile::{tempdir, TempDir};

    fn create_datasets() -> Datasets {
        let experiment = df!(
            GROUP => ["control", "control", "treatment", "treatment"],
            DAILY_ACTIVE_MINUTES => [20.0, 30.0, 27.0, 33.0],
            CHURNED_30D => [1i64, 0, 0, 0],
            AGE_GROUP => ["18-24", "25-34", "18-24", "25-34"],
            ACCOUNT_TYPE => ["casual", "creator", "casual", "creator"]
        )
        .unwrap();
        let predictions = df!(CHURN_PROBABILITY => [0.2, 0.65, 0.9, 0.6]).unwrap();

        Datasets {
            experiment: ExperimentTable::from_frame(experiment).unwrap(),
            predictions: PredictionTable::from_frame(predictions).unwrap(),
        }
    }

    fn create_reports_dir() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ReportArtifacts::SHAP_IMPORTANCE), b"png").unwrap();
        fs::write(dir.path().join(ReportArtifacts::SENTIMENT), b"png").unwrap();
        fs::write(
            dir.path().join(ReportArtifacts::WEEKLY_SUMMARY),
            "Short-form video engagement rose 6% week over week.",
        )
        .unwrap();
        dir
    }

    fn options() -> PageOptions {
        PageOptions {
            segment: Segment::AgeGroup,
            impact: ImpactInputs::new(200, 4, 12).unwrap(),
        }
    }

    fn value<'a>(report: &'a PageReport, label: &str) -> &'a str {
        report.metric(label).map(|m| m.value.as_str()).unwrap()
    }

    #[test]
    fn test_overview_page() {
        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);

        let report = dashboard.render(Page::Overview, &options()).unwrap();

        assert_eq!(value(&report, "Total Users"), "4");
        assert_eq!(value(&report, "Experiment Duration"), "4 Weeks");
        assert_eq!(value(&report, "Overall Churn Rate"), "25.0%");
        assert_eq!(value(&report, "Avg Daily Active Minutes"), "27.5");
        assert!(report.charts.is_empty());
    }

    #[test]
    fn test_ab_test_page() {
        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);

        let report = dashboard.render(Page::AbTest, &options()).unwrap();

        assert_eq!(value(&report, "Control Avg"), "25.0 min");
        let treatment = report.metric("Treatment Avg").unwrap();
        assert_eq!(treatment.value, "30.0 min");
        assert_eq!(treatment.delta.as_deref(), Some("+20.0%"));
        assert_eq!(report.data["segment"], "age_group");
    }

    #[test]
    fn test_churn_risk_page() {
        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);

        let report = dashboard.render(Page::ChurnRisk, &options()).unwrap();

        let high_risk = report.metric("High Risk Users").unwrap();
        assert_eq!(high_risk.value, "2");
        assert_eq!(high_risk.delta.as_deref(), Some("50.0% of users"));
        assert_eq!(report.images.len(), 1);
    }

    #[test]
    fn test_content_page_requires_artifacts() {
        let empty = tempdir().unwrap();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(empty.path()), None);

        let err = dashboard.render(Page::Content, &options()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::MissingArtifact(_))
        ));

        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);
        let report = dashboard.render(Page::Content, &options()).unwrap();
        assert!(report.text.unwrap().contains("week over week"));
    }

    #[test]
    fn test_impact_page() {
        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);

        let report = dashboard.render(Page::Impact, &options()).unwrap();

        assert_eq!(value(&report, "Incremental Engaged Users"), "24.0M");
        assert_eq!(value(&report, "Monthly Revenue Impact"), "$38.4M");
        assert_eq!(value(&report, "Annual Revenue Impact"), "$460.8M");
        assert_eq!(value(&report, "Avg LTV"), "$48");
        assert_eq!(value(&report, "Churn Savings"), "$288.0M");
        assert_eq!(value(&report, "Total Annual Impact"), "$748.8M");
        assert!(report.text.unwrap().contains(" 12%  $460.8M <"));
        assert_eq!(report.data["sensitivity"].as_array().map(Vec::len), Some(20));
    }

    #[test]
    fn test_pages_write_charts() {
        let reports = create_reports_dir();
        let charts = tempdir().unwrap();
        let charts_dir = charts.path().join("charts");
        let dashboard = Dashboard::new(
            create_datasets(),
            ReportArtifacts::new(reports.path()),
            Some(charts_dir.clone()),
        );

        let report = dashboard.render(Page::Impact, &options()).unwrap();

        assert_eq!(report.charts.len(), 1);
        assert_eq!(report.charts[0].path, charts_dir.join("impact_sensitivity.png"));
        assert!(report.charts[0].path.exists());
    }

    #[test]
    fn test_render_all_in_navigation_order() {
        let reports = create_reports_dir();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(reports.path()), None);

        let reports = dashboard.render_all(&Page::ALL, &options());
        let pages: Vec<Page> = reports.iter().map(|r| r.page).collect();
        assert_eq!(pages, Page::ALL.to_vec());
        assert!(reports.iter().all(|r| !r.is_failed()));

        let text = reports[4].to_string();
        assert!(text.starts_with("=== Product Recommendation ==="));
        assert!(text.contains("[SHIP] SHIP AI feed"));
    }

    #[test]
    fn test_render_all_keeps_pages_without_artifacts() {
        let empty = tempdir().unwrap();
        let dashboard = Dashboard::new(create_datasets(), ReportArtifacts::new(empty.path()), None);

        let snapshot = Snapshot::new(dashboard.render_all(&Page::ALL, &options()));
        assert_eq!(snapshot.pages.len(), 6);
        assert_eq!(snapshot.failures(), 2);

        let failed: Vec<Page> = snapshot
            .pages
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.page)
            .collect();
        assert_eq!(failed, vec![Page::ChurnRisk, Page::Content]);

        assert_eq!(value(&snapshot.pages[0], "Total Users"), "4");
        assert_eq!(value(&snapshot.pages[5], "Total Annual Impact"), "$748.8M");

        let churn_risk = &snapshot.pages[2];
        assert!(churn_risk.metrics.is_empty());
        assert!(churn_risk
            .error
            .as_deref()
            .unwrap()
            .contains(ReportArtifacts::SHAP_IMPORTANCE));
        assert!(churn_risk
            .to_string()
            .contains("[ERROR] page could not be rendered"));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["pages"][0].get("error").is_none());
        assert!(json["pages"][3]["error"].is_string());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = Snapshot::new(vec![recommendation()]);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["pages"][0]["page"], "recommendation");
        assert_eq!(json["pages"][0]["callouts"][0]["tone"], "success");
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_percent(0.1234), "12.3%");
        assert_eq!(format_dollars(4_800_000.0), "$4.8M");
        assert_eq!(format_dollars(1_440_000_000.0), "$1.44B");
    }
}
