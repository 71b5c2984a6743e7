use crate::measurement::Measurement;
use crate::transaction::TransactionData;
use fxload_core::SampleSet;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics_util::AtomicBucket;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters shared by every VU of a run.
pub(crate) struct TaskAtomics {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    success: Arc<AtomicU64>,
    error: Arc<AtomicU64>,
    latency: Arc<AtomicBucket<Duration>>,
    pub iterations: Arc<AtomicU64>,
    pub interrupted: Arc<AtomicU64>,
}

impl TaskAtomics {
    pub fn new(tps_limit: Option<NonZeroU32>) -> Self {
        Self {
            limiter: tps_limit.map(|tps| Arc::new(rate_limiter(tps))),
            success: Arc::new(AtomicU64::new(0)),
            error: Arc::new(AtomicU64::new(0)),
            latency: Arc::new(AtomicBucket::new()),
            iterations: Arc::new(AtomicU64::new(0)),
            interrupted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn clone_to_transaction_data(&self) -> TransactionData {
        TransactionData {
            limiter: self.limiter.clone(),
            success: self.success.clone(),
            error: self.error.clone(),
            latency: self.latency.clone(),
        }
    }

    /// Drain the counters gathered since the last collection into a `Measurement`, feeding the
    /// run-wide `samples` along the way.
    pub fn collect(&self, elapsed: Duration, vus: usize, samples: &mut SampleSet) -> Measurement {
        let success = self.success.swap(0, Ordering::Relaxed);
        let error = self.error.swap(0, Ordering::Relaxed);
        let mut measurement = Measurement::new(success, error, elapsed, vus);
        self.latency.clear_with(|dur| {
            measurement.populate_latencies(dur);
            samples.push_latencies(dur);
        });
        samples.push(measurement.sample());
        measurement
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn interrupted(&self) -> u64 {
        self.interrupted.load(Ordering::Relaxed)
    }
}

fn rate_limiter(tps_limit: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps_limit).allow_burst(NonZeroU32::MIN))
}
