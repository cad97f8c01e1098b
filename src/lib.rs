//! Engagement Intel: analytics dashboard for a feed-ranking A/B experiment
//!
//! This library loads the experiment and churn-prediction tables, computes the
//! descriptive statistics behind each dashboard page, projects the business
//! impact of an engagement lift and renders charts with Plotters.

pub mod cli;
pub mod data;
pub mod error;
pub mod impact;
pub mod pages;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use cli::{Args, OutputFormat};
pub use data::{load_datasets, Datasets, ReportArtifacts};
pub use error::DashboardError;
pub use impact::{project, sensitivity_curve, ImpactInputs, ImpactProjection};
pub use pages::{Dashboard, Page, PageOptions, PageReport, Snapshot};
pub use stats::{Lift, Segment};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
