//! Core types for the telemetry monitor
//! this crate contains the request event shape shared by the analyzer and the cli.
pub mod batch;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// LOG EVENT //

/// One observed request, as produced by the ingestion side

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub user_id: String, // who made the request

    pub endpoint: String, // path that was hit

    pub latency_ms: f64, // request duration in milliseconds

    #[serde(default)]
    pub tokens_used: u64, // usage counter reported by the service

    pub is_error: bool, // true if the request failed

    pub timestamp: DateTime<Utc>, // when the request happened
}

impl LogEvent {
    // create an event stamped with the current time
    pub fn new(user_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            endpoint: endpoint.into(),
            latency_ms: 0.0,
            tokens_used: 0,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_tokens(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// field names every record must carry for analysis
pub const LATENCY_FIELD: &str = "latency_ms";
pub const ERROR_FIELD: &str = "is_error";
