use pdatastructs::tdigest::{TDigest, K1};
use std::collections::VecDeque;
use std::time::Duration;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Rolling window of per-interval samples, plus cumulative totals for the whole run.
#[derive(Debug)]
pub struct SampleSet {
    samples: VecDeque<SampleData>,
    window_size: usize,
    latency: TDigest<K1>,
    total_success: u64,
    total_error: u64,
    total_elapsed: Duration,
}

impl SampleSet {
    pub fn new(window_size: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            window_size,
            latency: default_tdigest(),
            total_success: 0,
            total_error: 0,
            total_elapsed: Duration::ZERO,
        }
    }

    pub fn push(&mut self, sample: SampleData) {
        self.total_success += sample.success;
        self.total_error += sample.error;
        self.total_elapsed += sample.elapsed;

        self.samples.push_back(sample);
        if self.samples.len() > self.window_size {
            self.samples.pop_front();
        }
    }

    /// Separate Latency push method since the TDigest datastructure does not support merge, and is
    /// probabilistic in nature.
    pub fn push_latencies(&mut self, latencies: &[Duration]) {
        for latency in latencies {
            self.latency.insert(latency.as_secs_f64());
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// TPS over the rolling window
    pub fn mean_tps(&self) -> f64 {
        let (count, elapsed) = self
            .samples
            .iter()
            .fold((0, Duration::ZERO), |(c, e), s| (c + s.total(), e + s.elapsed));
        rate(count, elapsed)
    }

    /// Error rate over the rolling window
    pub fn mean_err(&self) -> f64 {
        let (error, count) = self
            .samples
            .iter()
            .fold((0, 0), |(e, c), s| (e + s.error, c + s.total()));
        ratio(error, count)
    }

    pub fn total_requests(&self) -> u64 {
        self.total_success + self.total_error
    }

    pub fn total_tps(&self) -> f64 {
        rate(self.total_requests(), self.total_elapsed)
    }

    pub fn total_error_rate(&self) -> f64 {
        ratio(self.total_error, self.total_requests())
    }

    /// Latency quantile over the whole run. Zero when nothing has been recorded.
    pub fn latency(&self, quantile: f64) -> Duration {
        let secs = self.latency.quantile(quantile);
        if secs.is_finite() && secs > 0. {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        0.
    } else {
        count as f64 / elapsed.as_secs_f64()
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.
    } else {
        part as f64 / total as f64
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub success: u64,
    pub error: u64,
    pub elapsed: Duration,
}

impl SampleData {
    pub fn tps(&self) -> f64 {
        rate(self.total(), self.elapsed)
    }

    pub fn error_rate(&self) -> f64 {
        ratio(self.error, self.total())
    }

    pub fn total(&self) -> u64 {
        self.success + self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(success: u64, error: u64) -> SampleData {
        SampleData {
            success,
            error,
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn window_rolls() {
        let mut samples = SampleSet::new(2);
        samples.push(sample(10, 0));
        samples.push(sample(20, 0));
        samples.push(sample(30, 10));

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.mean_tps(), 30.);
        assert_eq!(samples.mean_err(), 10. / 60.);

        assert_eq!(samples.total_requests(), 70);
        assert!((samples.total_tps() - 70. / 3.).abs() < 1e-9);
        assert_eq!(samples.total_error_rate(), 10. / 70.);
    }

    #[test]
    fn empty_is_zero() {
        let samples = SampleSet::new(10);
        assert!(samples.is_empty());
        assert_eq!(samples.mean_tps(), 0.);
        assert_eq!(samples.mean_err(), 0.);
        assert_eq!(samples.latency(0.5), Duration::ZERO);
        assert_eq!(sample(0, 0).error_rate(), 0.);
    }

    #[test]
    fn latency_quantiles() {
        let mut samples = SampleSet::new(10);
        let latencies: Vec<_> = (1..=100).map(Duration::from_millis).collect();
        samples.push_latencies(&latencies);

        let p50 = samples.latency(0.5);
        assert!(p50 >= Duration::from_millis(40) && p50 <= Duration::from_millis(60));
        assert!(samples.latency(0.99) > p50);
    }
}
