//! Error types for advisory-parser.

use thiserror::Error;

/// Errors that can occur while producing advisories.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// Failed to spawn the audit subprocess
    #[error("Failed to spawn yarn npm audit: {0}")]
    SpawnFailed(String),

    /// The audit subprocess produced no output
    #[error("yarn npm audit returned empty output")]
    EmptyOutput,

    /// The audit report was not valid JSON or was missing required fields
    #[error("Failed to parse audit report: {0}")]
    ParseFailed(String),
}
