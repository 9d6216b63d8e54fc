//! Statistical anomaly detection over a batch of request events

use crate::config::{AnalyzerConfig, ConfigError};
use crate::error::AnalysisError;
use crate::stats::{LatencyStats, error_rate};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use telemon_core::{ERROR_FIELD, LATENCY_FIELD, LogEvent};

pub const LATENCY_SPIKE_MESSAGE: &str = "CRITICAL: Latency spike detected";
pub const HIGH_ERROR_RATE_MESSAGE: &str = "WARNING: High error rate detected";

// how urgent an anomaly is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

// the two things a batch can be flagged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    LatencySpike,  // max latency above mean + k * stddev
    HighErrorRate, // failed fraction above the configured rate
}

impl Anomaly {
    pub fn message(&self) -> &'static str {
        match self {
            Anomaly::LatencySpike => LATENCY_SPIKE_MESSAGE,
            Anomaly::HighErrorRate => HIGH_ERROR_RATE_MESSAGE,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::LatencySpike => Severity::Critical,
            Anomaly::HighErrorRate => Severity::Warning,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// statistics the verdict was based on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
    pub mean_latency_ms: f64,
    pub latency_std_dev_ms: f64,
    pub spike_threshold_ms: f64,
    pub max_latency_ms: f64,
    pub error_count: usize,
    pub error_rate: f64,
}

/// Outcome of analyzing one batch.
///
/// `summary` is `None` when the batch was too small to be judged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub event_count: usize,
    pub anomalies: Vec<Anomaly>,
    pub summary: Option<BatchSummary>,
}

impl Analysis {
    fn skipped(event_count: usize) -> Self {
        Self {
            event_count,
            anomalies: Vec::new(),
            summary: None,
        }
    }

    pub fn was_evaluated(&self) -> bool {
        self.summary.is_some()
    }

    pub fn messages(&self) -> Vec<String> {
        self.anomalies.iter().map(|a| a.message().to_string()).collect()
    }
}

// the two fields the checks actually read
#[derive(Debug, Clone, Copy)]
struct Sample {
    latency_ms: f64,
    is_error: bool,
}

impl Sample {
    fn checked(index: usize, latency_ms: f64, is_error: bool) -> Result<Self, AnalysisError> {
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(AnalysisError::InvalidLatency {
                index,
                value: latency_ms,
            });
        }
        Ok(Self { latency_ms, is_error })
    }

    fn from_event(index: usize, event: &LogEvent) -> Result<Self, AnalysisError> {
        Self::checked(index, event.latency_ms, event.is_error)
    }

    fn from_record(index: usize, record: &Value) -> Result<Self, AnalysisError> {
        let fields = record
            .as_object()
            .ok_or_else(|| AnalysisError::invalid_structure(index, "is not an object"))?;

        let latency_ms = match fields.get(LATENCY_FIELD) {
            None => return Err(missing(index, LATENCY_FIELD)),
            Some(value) => value.as_f64().ok_or_else(|| {
                AnalysisError::invalid_structure(index, format!("has a non-numeric `{}`", LATENCY_FIELD))
            })?,
        };

        let is_error = match fields.get(ERROR_FIELD) {
            None => return Err(missing(index, ERROR_FIELD)),
            Some(value) => value.as_bool().ok_or_else(|| {
                AnalysisError::invalid_structure(index, format!("has a non-boolean `{}`", ERROR_FIELD))
            })?,
        };

        Self::checked(index, latency_ms, is_error)
    }
}

fn missing(index: usize, field: &str) -> AnalysisError {
    AnalysisError::invalid_structure(index, format!("is missing `{}`", field))
}

/// Flags latency spikes and high error rates in a batch of events.
///
/// Holds only its thresholds, so one analyzer can be shared freely and
/// every call is a pure function of the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyAnalyzer {
    config: AnalyzerConfig,
}

impl AnomalyAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    // like new but rejects nonsensical thresholds
    pub fn try_new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Anomaly messages for a batch of typed events.
    ///
    /// Empty and undersized batches yield an empty list without looking at
    /// the events. Otherwise the latency check runs before the error-rate
    /// check, so a latency message always comes first.
    pub fn detect_anomalies(&self, events: &[LogEvent]) -> Result<Vec<String>, AnalysisError> {
        Ok(self.analyze(events)?.messages())
    }

    /// Same as [`detect_anomalies`](Self::detect_anomalies) for untyped
    /// records straight from the ingestion side.
    ///
    /// Once the batch is large enough, every record must carry a numeric
    /// `latency_ms` and a boolean `is_error`, otherwise the whole call fails
    /// with [`AnalysisError::InvalidStructure`].
    pub fn detect_anomalies_raw(&self, records: &[Value]) -> Result<Vec<String>, AnalysisError> {
        Ok(self.analyze_raw(records)?.messages())
    }

    pub fn analyze(&self, events: &[LogEvent]) -> Result<Analysis, AnalysisError> {
        if !self.has_enough_events(events.len()) {
            return Ok(Analysis::skipped(events.len()));
        }

        let samples = events
            .iter()
            .enumerate()
            .map(|(i, event)| Sample::from_event(i, event))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.evaluate(&samples))
    }

    pub fn analyze_raw(&self, records: &[Value]) -> Result<Analysis, AnalysisError> {
        if !self.has_enough_events(records.len()) {
            return Ok(Analysis::skipped(records.len()));
        }

        let samples = records
            .iter()
            .enumerate()
            .map(|(i, record)| Sample::from_record(i, record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.evaluate(&samples))
    }

    fn has_enough_events(&self, count: usize) -> bool {
        count > 0 && count >= self.config.min_events_for_analysis
    }

    // runs both checks over an already validated, non-empty batch
    fn evaluate(&self, samples: &[Sample]) -> Analysis {
        let latencies: Vec<f64> = samples.iter().map(|s| s.latency_ms).collect();
        let Some(stats) = LatencyStats::from_samples(&latencies) else {
            return Analysis::skipped(samples.len());
        };

        let mut anomalies = Vec::new();

        // strict: a max sitting exactly on the threshold is not a spike
        let threshold = stats.spike_threshold(self.config.latency_std_multiplier);
        if stats.max > threshold {
            anomalies.push(Anomaly::LatencySpike);
        }

        let error_count = samples.iter().filter(|s| s.is_error).count();
        let rate = error_rate(error_count, samples.len());
        if rate > self.config.max_error_rate {
            anomalies.push(Anomaly::HighErrorRate);
        }

        Analysis {
            event_count: samples.len(),
            anomalies,
            summary: Some(BatchSummary {
                mean_latency_ms: stats.mean,
                latency_std_dev_ms: stats.std_dev,
                spike_threshold_ms: threshold,
                max_latency_ms: stats.max,
                error_count,
                error_rate: rate,
            }),
        }
    }
}

/// [`AnomalyAnalyzer::detect_anomalies`] with the default thresholds.
pub fn detect_anomalies(events: &[LogEvent]) -> Result<Vec<String>, AnalysisError> {
    AnomalyAnalyzer::default().detect_anomalies(events)
}
