// Telemon CLI - batch anomaly checks for request telemetry

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use telemon_anomaly::config::load_config;
use telemon_anomaly::detection::{Analysis, BatchSummary, Severity};
use telemon_anomaly::{AnalyzerConfig, AnomalyAnalyzer, AnomalyRunner};
use tracing::Level;

// exit status for --strict when something fired
const ANOMALY_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "telemon")]
#[command(version = "0.1.0")]
#[command(about = "Latency spike and error rate checks for request log batches", long_about = None)]
struct Cli {
    /// Threshold config file (TOML)
    #[arg(short, long, env = "TELEMON_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch file once
    Analyze {
        /// Batch file (JSON array or JSON Lines)
        file: PathBuf,

        #[command(flatten)]
        thresholds: Thresholds,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 2 when an anomaly is detected
        #[arg(long)]
        strict: bool,
    },

    /// Re-analyze a batch file periodically
    Watch {
        /// Batch file (JSON array or JSON Lines)
        file: PathBuf,

        /// Seconds between checks
        #[arg(short, long, default_value = "60")]
        interval: u64,

        #[command(flatten)]
        thresholds: Thresholds,
    },
}

// per-run overrides on top of the config file
#[derive(Args)]
struct Thresholds {
    /// Minimum batch size before analysis runs
    #[arg(long)]
    min_events: Option<usize>,

    /// Standard deviations above mean latency that count as a spike
    #[arg(long)]
    latency_std_multiplier: Option<f64>,

    /// Error rate (0.0 - 1.0) above which the batch is flagged
    #[arg(long)]
    max_error_rate: Option<f64>,
}

impl Thresholds {
    fn apply(&self, mut config: AnalyzerConfig) -> AnalyzerConfig {
        if let Some(n) = self.min_events {
            config.min_events_for_analysis = n;
        }
        if let Some(k) = self.latency_std_multiplier {
            config.latency_std_multiplier = k;
        }
        if let Some(rate) = self.max_error_rate {
            config.max_error_rate = rate;
        }
        config
    }
}

#[derive(Serialize)]
struct Report<'a> {
    event_count: usize,
    anomalies: Vec<String>,
    summary: Option<&'a BatchSummary>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // logs go to stderr so stdout stays clean for results
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Analyze {
            file,
            thresholds,
            json,
            strict,
        } => {
            let runner = AnomalyRunner::new(build_analyzer(cli.config.as_ref(), thresholds)?);
            let analysis = runner.check_file(file)?;

            if *json {
                print_json(&analysis)?;
            } else {
                print_analysis(&analysis, runner.analyzer().config());
            }

            if *strict && !analysis.anomalies.is_empty() {
                std::process::exit(ANOMALY_EXIT_CODE);
            }
        }
        Commands::Watch {
            file,
            interval,
            thresholds,
        } => {
            let runner = AnomalyRunner::new(build_analyzer(cli.config.as_ref(), thresholds)?);
            runner.watch(file, Duration::from_secs(*interval)).await;
        }
    }

    Ok(())
}

// config file (or defaults) plus command line overrides
fn build_analyzer(
    config_path: Option<&PathBuf>,
    thresholds: &Thresholds,
) -> Result<AnomalyAnalyzer, Box<dyn std::error::Error>> {
    let base = match config_path {
        Some(path) => load_config(path)?,
        None => AnalyzerConfig::default(),
    };

    Ok(AnomalyAnalyzer::try_new(thresholds.apply(base))?)
}

fn print_json(analysis: &Analysis) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report {
        event_count: analysis.event_count,
        anomalies: analysis.messages(),
        summary: analysis.summary.as_ref(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_analysis(analysis: &Analysis, config: &AnalyzerConfig) {
    println!("\n{}", "Anomaly Check".cyan().bold());
    println!("{}", "-".repeat(50).dimmed());

    let Some(summary) = &analysis.summary else {
        println!(
            "  {} {} events, need at least {} to analyze",
            "Skipped:".yellow(),
            analysis.event_count,
            config.min_events_for_analysis
        );
        println!();
        return;
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Events".to_string(), analysis.event_count.to_string()]);
    table.add_row(vec![
        "Mean latency".to_string(),
        format!("{:.1} ms", summary.mean_latency_ms),
    ]);
    table.add_row(vec![
        "Std deviation".to_string(),
        format!("{:.1} ms", summary.latency_std_dev_ms),
    ]);
    table.add_row(vec![
        "Spike threshold".to_string(),
        format!(
            "{:.1} ms ({}σ)",
            summary.spike_threshold_ms, config.latency_std_multiplier
        ),
    ]);
    table.add_row(vec![
        "Max latency".to_string(),
        format!("{:.1} ms", summary.max_latency_ms),
    ]);
    table.add_row(vec![
        "Errors".to_string(),
        format!(
            "{} ({:.1}%, limit {:.1}%)",
            summary.error_count,
            summary.error_rate * 100.0,
            config.max_error_rate * 100.0
        ),
    ]);
    println!("{table}");
    println!();

    if analysis.anomalies.is_empty() {
        println!("  {} No anomalies detected", "✓".green());
    } else {
        for anomaly in &analysis.anomalies {
            let line = match anomaly.severity() {
                Severity::Critical => anomaly.message().red().bold(),
                Severity::Warning => anomaly.message().yellow().bold(),
            };
            println!("  {}", line);
        }
    }
    println!();
}
