//! Named boolean assertions
//!
//! A failing check does not stop a VU or mark a transaction as failed; it is only counted, and
//! reported in [`RunStatistics::checks`](fxload_core::RunStatistics).
use crate::vu::VU;
use fxload_core::CheckSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Record the outcome of a named check for the running scenario and return `passed`.
///
/// # Example
/// ```no_run
/// use fxload::prelude::*;
///
/// #[scenario]
/// async fn my_scenario() {
///     let status = 201;
///     check("status is 201", status == 201);
/// }
/// ```
pub fn check(name: &str, passed: bool) -> bool {
    let recorded = VU.try_with(|vu| vu.checks.record(name, passed)).is_ok();
    if !recorded {
        tracing::warn!("Check `{name}` recorded outside of a running scenario.");
    }

    #[cfg(feature = "metrics")]
    metrics::counter!(
        fxload_core::CHECKS_METRIC,
        "check" => name.to_string(),
        "result" => if passed { "pass" } else { "fail" }
    )
    .increment(1);

    passed
}

#[derive(Debug, Default)]
struct CheckCounter {
    passes: AtomicU64,
    fails: AtomicU64,
}

/// Pass/fail counts per check name, kept in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct CheckRegistry {
    checks: RwLock<Vec<(String, Arc<CheckCounter>)>>,
}

impl CheckRegistry {
    pub fn record(&self, name: &str, passed: bool) {
        let counter = self.counter(name);
        if passed {
            counter.passes.fetch_add(1, Ordering::Relaxed);
        } else {
            counter.fails.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn summaries(&self) -> Vec<CheckSummary> {
        self.checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, counter)| CheckSummary {
                name: name.clone(),
                passes: counter.passes.load(Ordering::Relaxed),
                fails: counter.fails.load(Ordering::Relaxed),
            })
            .collect()
    }

    fn counter(&self, name: &str) -> Arc<CheckCounter> {
        {
            let checks = self.checks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((_, counter)) = checks.iter().find(|(n, _)| n == name) {
                return counter.clone();
            }
        }

        let mut checks = self.checks.write().unwrap_or_else(PoisonError::into_inner);
        // Another VU may have registered it between the two locks
        if let Some((_, counter)) = checks.iter().find(|(n, _)| n == name) {
            return counter.clone();
        }

        let counter = Arc::new(CheckCounter::default());
        checks.push((name.to_string(), counter.clone()));
        counter
    }
}
