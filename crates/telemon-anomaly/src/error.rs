use thiserror::Error;

/// Errors raised when a batch is large enough to analyze but cannot be.
///
/// Batches below the minimum size never produce these; they are skipped
/// before any record is looked at.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    // a record lacks `latency_ms` / `is_error` or has the wrong type for them
    #[error("Invalid log event structure: record {index} {reason}")]
    InvalidStructure { index: usize, reason: String },

    #[error("Invalid latency on record {index}: {value} (must be a finite, non-negative number)")]
    InvalidLatency { index: usize, value: f64 },
}

impl AnalysisError {
    pub(crate) fn invalid_structure(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            index,
            reason: reason.into(),
        }
    }
}
