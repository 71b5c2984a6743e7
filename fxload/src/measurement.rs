use fxload_core::SampleData;
use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::time::Duration;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// What happened during a single sample interval.
#[derive(Debug, Clone)]
pub(crate) struct Measurement {
    pub success: u64,
    pub error: u64,
    pub tps: f64,
    pub error_rate: f64,
    pub elapsed: Duration,
    pub vus: usize,
    latency: TDigest<K1>,
}

impl Measurement {
    pub fn new(success: u64, error: u64, elapsed: Duration, vus: usize) -> Self {
        let sample = SampleData {
            success,
            error,
            elapsed,
        };
        Self {
            success,
            error,
            tps: sample.tps(),
            error_rate: sample.error_rate(),
            elapsed,
            vus,
            latency: default_tdigest(),
        }
    }

    pub fn populate_latencies(&mut self, dur: &[Duration]) {
        for latency in dur {
            self.latency.insert(latency.as_secs_f64());
        }
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        let secs = self.latency.quantile(quantile);
        if secs.is_finite() && secs > 0. {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }

    pub fn sample(&self) -> SampleData {
        SampleData {
            success: self.success,
            error: self.error,
            elapsed: self.elapsed,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VUs={}, TPS={:.2}, ErrorRate={:.2}, p50={:?}, p90={:?}, p99={:?}",
            self.vus,
            self.tps,
            self.error_rate,
            self.latency(0.5),
            self.latency(0.90),
            self.latency(0.99),
        )
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_latencies() {
        let m = Measurement::new(0, 0, Duration::from_secs(1), 0);
        assert_eq!(
            m.to_string(),
            "VUs=0, TPS=0.00, ErrorRate=0.00, p50=0ns, p90=0ns, p99=0ns"
        );
    }
}
