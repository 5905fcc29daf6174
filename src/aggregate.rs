use tokio::sync::mpsc;

use crate::{config::Fields, error::CycleError};

/// Min, max, mean and population standard deviation of a sample stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
}
impl Summary {
    /// Drains `samples` until every sender is dropped.
    pub async fn collect(samples: &mut mpsc::Receiver<f64>) -> Result<Self, CycleError> {
        let mut acc = Accumulator::new();
        while let Some(sample) = samples.recv().await {
            acc.push(sample);
        }
        acc.finish()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Result<Self, CycleError> {
        samples.into_iter().collect::<Accumulator>().finish()
    }

    pub fn write_fields(&self, fields: &mut Fields) {
        fields.insert("min".to_string(), format_value(self.min));
        fields.insert("max".to_string(), format_value(self.max));
        fields.insert("mean".to_string(), format_value(self.mean));
        fields.insert("stddev".to_string(), format_value(self.stddev));
    }
}

/// Shortest decimal that parses back to the same `f64`, never in exponent form.
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// Streaming reduction in constant memory (Welford's update).
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    count: u64,
    dropped: u64,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
}
impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite samples are dropped.
    pub fn push(&mut self, sample: f64) {
        if !sample.is_finite() {
            tracing::debug!(sample, "dropping non-finite sample");
            self.dropped += 1;
            return;
        }
        self.count += 1;
        if self.count == 1 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (sample - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn finish(&self) -> Result<Summary, CycleError> {
        self.summary().ok_or(CycleError::EmptyStream {
            dropped: self.dropped,
        })
    }

    pub fn summary(&self) -> Option<Summary> {
        if self.count == 0 {
            return None;
        }
        let variance = (self.m2 / self.count as f64).max(0.0);
        Some(Summary {
            min: self.min,
            max: self.max,
            // rounding can push the running mean a hair outside the range
            mean: self.mean.clamp(self.min, self.max),
            stddev: variance.sqrt(),
        })
    }
}
impl Extend<f64> for Accumulator {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for sample in iter {
            self.push(sample);
        }
    }
}
impl FromIterator<f64> for Accumulator {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}
