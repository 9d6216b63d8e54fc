//! batch decoding - turn a file of events into untyped records
//!
//! Records stay as `serde_json::Value` here. Checking that they have the
//! shape of a [`LogEvent`](crate::LogEvent) is left to the analyzer, which
//! only does it once a batch is big enough to be analyzed.

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

// decode error type
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON on line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a batch from either a JSON array or JSON Lines.
///
/// Whitespace-only input is an empty batch. Blank lines in JSON Lines input
/// are skipped; line numbers in errors are 1-based.
pub fn decode_batch(input: &str) -> Result<Vec<Value>, BatchError> {
    let trimmed = input.trim_start();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(trimmed)?;
        return Ok(records);
    }

    let mut records = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| BatchError::Line {
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

// read a batch file from disk and decode it
pub fn read_batch<P: AsRef<Path>>(path: P) -> Result<Vec<Value>, BatchError> {
    let content = fs::read_to_string(path)?;
    decode_batch(&content)
}
