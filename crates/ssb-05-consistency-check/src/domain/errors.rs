//! Error types for the consistency checker.

use ssb_03_feed_validation::LogError;
use thiserror::Error;

/// Why a check produced no report.
///
/// Inconsistencies are never errors: they are collected into the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsckError {
    #[error("storage error: {0}")]
    Storage(#[from] LogError),

    /// Cancelled through the shutdown signal. The partial report is dropped.
    #[error("consistency check cancelled")]
    Cancelled,
}
