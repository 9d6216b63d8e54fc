//! Configuration for batch anomaly detection

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

// smallest batch we are willing to judge
pub const DEFAULT_MIN_EVENTS_FOR_ANALYSIS: usize = 20;

// standard deviations above the mean that count as a spike
pub const DEFAULT_LATENCY_STD_MULTIPLIER: f64 = 3.0;

// fraction of failed requests above which the batch is unhealthy
pub const DEFAULT_MAX_ERROR_RATE: f64 = 0.20;

// Thresholds used by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    // batches smaller than this are never analyzed
    pub min_events_for_analysis: usize,

    // spike threshold is mean + multiplier * stddev
    pub latency_std_multiplier: f64,

    // error rate strictly above this is flagged (0.0 - 1.0)
    pub max_error_rate: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_events_for_analysis: DEFAULT_MIN_EVENTS_FOR_ANALYSIS,
            latency_std_multiplier: DEFAULT_LATENCY_STD_MULTIPLIER,
            max_error_rate: DEFAULT_MAX_ERROR_RATE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AnalyzerConfig {
    // reject thresholds that would make the checks meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let multiplier = self.latency_std_multiplier;
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "latency_std_multiplier must be a non-negative number, got {}",
                multiplier
            )));
        }

        if !(0.0..=1.0).contains(&self.max_error_rate) {
            return Err(ConfigError::Invalid(format!(
                "max_error_rate must be between 0.0 and 1.0, got {}",
                self.max_error_rate
            )));
        }

        Ok(())
    }
}

// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalyzerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AnalyzerConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
