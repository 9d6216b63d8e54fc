//! Telemon batch anomaly detection

pub mod config;
pub mod detection;
pub mod error;
pub mod runner;
pub mod stats;

pub use config::AnalyzerConfig;
pub use detection::{Analysis, Anomaly, AnomalyAnalyzer, detect_anomalies};
pub use error::AnalysisError;
pub use runner::AnomalyRunner;
