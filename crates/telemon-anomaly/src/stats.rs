//! Batch statistics used by the detector

// latency distribution of one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub mean: f64,
    pub std_dev: f64, // population standard deviation (divides by n)
    pub max: f64,
}

impl LatencyStats {
    /// Mean, population standard deviation and maximum of `samples`.
    ///
    /// Returns `None` for an empty slice.
    ///
    /// Finite samples always give a finite mean and standard deviation, even
    /// when the plain sums would overflow.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (mean, std_dev) = moments(samples, 1.0);

        if mean.is_finite() && std_dev.is_finite() {
            return Some(Self { mean, std_dev, max });
        }

        // sums overflowed: redo the math in units of the largest magnitude
        let scale = samples.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
        let (mean, std_dev) = moments(samples, scale);

        Some(Self {
            mean: mean * scale,
            std_dev: std_dev * scale,
            max,
        })
    }

    // value the max has to strictly exceed to count as a spike
    pub fn spike_threshold(&self, multiplier: f64) -> f64 {
        self.mean + multiplier * self.std_dev
    }
}

// mean and population stddev of samples / scale
fn moments(samples: &[f64], scale: f64) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|x| x / scale).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|x| (x / scale - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

// fraction of flagged items, 0.0 for an empty batch
pub fn error_rate(errors: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    errors as f64 / total as f64
}
