// Telemon batch simulator - prints a synthetic batch of request events as JSON
// Pipe it into `telemon analyze` to exercise the checks

use chrono::{Duration, Utc};
use clap::Parser;
use rand::prelude::*;
use telemon_core::LogEvent;

const ENDPOINTS: [&str; 4] = ["/chat", "/completions", "/embeddings", "/health"];

// upper bounds for the flags, keeps timestamps and latencies in range
const MAX_COUNT: u64 = 1_000_000;
const MAX_LATENCY_MS: u64 = 3_600_000;

#[derive(Parser)]
#[command(name = "telemon-simulate")]
#[command(about = "Generate a synthetic request event batch for telemon")]
struct Args {
    /// Number of events in the batch
    #[arg(short, long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..=MAX_COUNT))]
    count: u64,

    /// Error rate percentage (0-100)
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u8).range(0..=100))]
    error_rate: u8,

    /// Base latency in milliseconds
    #[arg(short, long, default_value = "100", value_parser = clap::value_parser!(u64).range(0..=MAX_LATENCY_MS))]
    base_latency: u64,

    /// Random latency added on top of the base (0..=jitter ms)
    #[arg(short, long, default_value = "20", value_parser = clap::value_parser!(u64).range(0..=MAX_LATENCY_MS))]
    jitter: u64,

    /// Inject one event with this latency
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(0..=MAX_LATENCY_MS))]
    spike: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let events = generate_batch(&args);
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn generate_batch(args: &Args) -> Vec<LogEvent> {
    let mut rng = rand::rng();
    let error_rate = args.error_rate.min(100) as u32;
    let span = Duration::try_seconds(args.count as i64).unwrap_or(Duration::zero());
    let start = Utc::now() - span;

    let mut events: Vec<LogEvent> = (0..args.count)
        .map(|i| {
            let user_id = format!("user_{}", rng.random_range(1000..9999));
            let endpoint = ENDPOINTS[rng.random_range(0..ENDPOINTS.len())];
            let latency = args
                .base_latency
                .saturating_add(rng.random_range(0..=args.jitter));
            let offset = Duration::try_seconds(i as i64).unwrap_or(Duration::zero());

            LogEvent::new(user_id, endpoint)
                .with_latency(latency as f64)
                .with_tokens(rng.random_range(10..500))
                .with_error(rng.random_ratio(error_rate, 100))
                .with_timestamp(start + offset)
        })
        .collect();

    // spike lands on a random event so batch order doesn't give it away
    if let Some(spike) = args.spike {
        if !events.is_empty() {
            let idx = rng.random_range(0..events.len());
            events[idx].latency_ms = spike as f64;
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_out_of_range_rejected() {
        let huge = u64::MAX.to_string();
        for flag in ["--count", "--base-latency", "--jitter", "--spike"] {
            assert!(
                Args::try_parse_from(["telemon-simulate", flag, huge.as_str()]).is_err(),
                "{} accepted {}",
                flag,
                huge
            );
        }
        assert!(Args::try_parse_from(["telemon-simulate", "--count", "0"]).is_err());
        assert!(Args::try_parse_from(["telemon-simulate", "--error-rate", "101"]).is_err());
    }

    #[test]
    fn test_generate_at_upper_bounds() {
        let args = Args::try_parse_from([
            "telemon-simulate",
            "--count",
            "50",
            "--error-rate",
            "100",
            "--base-latency",
            "3600000",
            "--jitter",
            "3600000",
            "--spike",
            "3600000",
        ])
        .unwrap();

        let events = generate_batch(&args);

        assert_eq!(events.len(), 50);
        assert!(events.iter().all(|e| e.is_error));
        assert!(events.iter().all(|e| e.latency_ms <= 7_200_000.0));
    }

    #[test]
    fn test_generate_defaults() {
        let args = Args::try_parse_from(["telemon-simulate", "--spike", "5000"]).unwrap();

        let events = generate_batch(&args);

        assert_eq!(events.len(), 100);
        assert_eq!(events.iter().filter(|e| e.latency_ms == 5000.0).count(), 1);
        assert!(events.iter().all(|e| e.latency_ms >= 100.0));
    }
}
