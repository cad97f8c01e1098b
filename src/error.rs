//! Domain error types
//!
//! Application code propagates these through `anyhow`, so callers that need
//! to branch on a failure can `downcast_ref::<DashboardError>()`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by data loading, validation and the projection model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// A required dataset file does not exist
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// A dataset loaded but contains no rows
    #[error("{table} has no rows")]
    EmptyTable {
        /// Table name
        table: &'static str,
    },

    /// A row violates a table invariant
    #[error("{table} row {row}: {message}")]
    InvalidRow {
        /// Table name
        table: &'static str,
        /// Zero-based row index
        row: usize,
        /// What is wrong with the row
        message: String,
    },

    /// A projection input lies outside its slider range
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Input name
        name: &'static str,
        /// Rejected value
        value: u32,
        /// Inclusive lower bound
        min: u32,
        /// Inclusive upper bound
        max: u32,
    },

    /// A static report artifact (image or text) is missing
    #[error("report artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),
}
