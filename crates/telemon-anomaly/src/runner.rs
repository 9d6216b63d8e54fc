use crate::config::{ConfigError, load_config};
use crate::detection::{Analysis, AnomalyAnalyzer};
use crate::error::AnalysisError;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use telemon_core::batch::read_batch;
use tokio::time::interval;
use tracing::{debug, info, warn};

// wraps the analyzer with logging, the analyzer itself stays silent

pub struct AnomalyRunner {
    analyzer: AnomalyAnalyzer,
}

impl AnomalyRunner {
    pub fn new(analyzer: AnomalyAnalyzer) -> Self {
        Self { analyzer }
    }

    // create a runner from a config file
    pub fn from_config_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config = load_config(config_path)?;
        Ok(Self::new(AnomalyAnalyzer::new(config)))
    }

    pub fn analyzer(&self) -> &AnomalyAnalyzer {
        &self.analyzer
    }

    // analyze one batch and log what came out of it
    pub fn check_batch(&self, records: &[Value]) -> Result<Analysis, AnalysisError> {
        match self.analyzer.analyze_raw(records) {
            Ok(analysis) => {
                log_analysis(&analysis, self.analyzer.config().min_events_for_analysis);
                Ok(analysis)
            }
            Err(e) => {
                warn!(events = records.len(), error = %e, "Batch rejected");
                Err(e)
            }
        }
    }

    // read a batch file and check it
    pub fn check_file<P: AsRef<Path>>(&self, path: P) -> Result<Analysis, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let records = read_batch(path)?;
        debug!(path = %path.display(), events = records.len(), "Loaded batch");
        Ok(self.check_batch(&records)?)
    }

    /// Re-check the batch file every `every`, forever.
    ///
    /// Each tick is judged on its own; nothing carries over between ticks.
    /// Failed ticks are logged and the loop keeps going.
    pub async fn watch<P: AsRef<Path>>(&self, path: P, every: Duration) {
        let path = path.as_ref();
        let mut ticker = interval(every);

        info!(path = %path.display(), interval_secs = every.as_secs(), "Starting anomaly watch loop");

        loop {
            ticker.tick().await;

            if let Err(e) = self.check_file(path) {
                warn!(path = %path.display(), error = %e, "Check failed");
            }
        }
    }
}

fn log_analysis(analysis: &Analysis, min_events: usize) {
    let Some(summary) = &analysis.summary else {
        debug!(
            events = analysis.event_count,
            min_events, "Batch too small, skipping analysis"
        );
        return;
    };

    if analysis.anomalies.is_empty() {
        debug!(
            events = analysis.event_count,
            mean_latency_ms = summary.mean_latency_ms,
            error_rate = summary.error_rate,
            "No anomalies"
        );
        return;
    }

    for anomaly in &analysis.anomalies {
        info!(
            severity = ?anomaly.severity(),
            events = analysis.event_count,
            max_latency_ms = summary.max_latency_ms,
            threshold_ms = summary.spike_threshold_ms,
            error_rate = summary.error_rate,
            "{}",
            anomaly
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(count: usize, latency: u64, errors: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"latency_ms": latency, "is_error": i < errors}))
            .collect()
    }

    #[test]
    fn test_check_batch_returns_analysis() {
        let runner = AnomalyRunner::new(AnomalyAnalyzer::default());

        let analysis = runner.check_batch(&records(20, 100, 10)).unwrap();

        assert!(analysis.was_evaluated());
        assert_eq!(analysis.messages(), vec!["WARNING: High error rate detected"]);
    }

    #[test]
    fn test_check_batch_passes_errors_through() {
        let runner = AnomalyRunner::new(AnomalyAnalyzer::default());
        let bad = vec![json!({"endpoint": "/chat"}); 20];

        assert!(matches!(
            runner.check_batch(&bad),
            Err(AnalysisError::InvalidStructure { index: 0, .. })
        ));
    }

    #[test]
    fn test_check_file() {
        let path = std::env::temp_dir().join(format!("telemon-runner-{}.json", std::process::id()));
        let body = serde_json::to_string(&records(20, 100, 0)).unwrap();
        std::fs::write(&path, body).unwrap();

        let runner = AnomalyRunner::new(AnomalyAnalyzer::default());
        let analysis = runner.check_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(analysis.event_count, 20);
        assert!(analysis.anomalies.is_empty());
    }

    #[test]
    fn test_check_missing_file_fails() {
        let runner = AnomalyRunner::new(AnomalyAnalyzer::default());
        assert!(runner.check_file("/nonexistent/telemon/batch.json").is_err());
    }

    #[tokio::test]
    async fn test_watch_keeps_running_on_failures() {
        let runner = AnomalyRunner::new(AnomalyAnalyzer::default());

        // a missing file must not end the loop
        let watched = tokio::time::timeout(
            Duration::from_millis(50),
            runner.watch("/nonexistent/telemon/batch.json", Duration::from_millis(10)),
        )
        .await;

        assert!(watched.is_err());
    }
}
