//! Virtual users
//!
//! Every VU is a tokio task running the scenario function in a loop. Scenario code can ask which
//! VU it runs on and which iteration it is in through [`id`] and [`iteration`].
use crate::check::CheckRegistry;
use crate::measurement::Measurement;
use crate::task_atomics::TaskAtomics;
use crate::transaction::TRANSACTION_HOOK;
use fxload_core::{SampleSet, ScenarioConfig};
use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Clone)]
pub(crate) struct VuContext {
    pub id: usize,
    /// Iteration currently running on this VU
    pub iteration: Arc<AtomicU64>,
    pub checks: Arc<CheckRegistry>,
}

tokio::task_local! {
    pub(crate) static VU: VuContext;
}

/// The 1-based id of the VU running the current task, or `None` outside of a scenario.
pub fn id() -> Option<usize> {
    VU.try_with(|vu| vu.id).ok()
}

/// The 0-based iteration of the current VU, or `None` outside of a scenario.
///
/// Iterations are counted per VU. A VU id which is retired and later brought back keeps counting
/// from where it stopped, so `(id, iteration)` is unique within a run.
pub fn iteration() -> Option<u64> {
    VU.try_with(|vu| vu.iteration.load(Ordering::Relaxed)).ok()
}

struct Vu {
    id: usize,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct RetiringVu {
    vu: Vu,
    deadline: Instant,
}

pub(crate) struct VuPool<T> {
    scenario: T,
    task_atomics: TaskAtomics,
    checks: Arc<CheckRegistry>,
    /// Sorted by id
    active: Vec<Vu>,
    retiring: Vec<RetiringVu>,
    /// Next iteration to start, indexed by `id - 1` and kept across retirements
    next_iterations: Vec<Arc<AtomicU64>>,
    graceful_ramp_down: Duration,
    max_vus: usize,
}

impl<T, F> VuPool<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    pub fn new(scenario: T, config: &ScenarioConfig) -> Self {
        Self {
            scenario,
            task_atomics: TaskAtomics::new(config.max_tps),
            checks: Arc::new(CheckRegistry::default()),
            active: vec![],
            retiring: vec![],
            next_iterations: vec![],
            graceful_ramp_down: config.graceful_ramp_down,
            max_vus: 0,
        }
    }

    /// Grow or shrink the number of active VUs.
    ///
    /// New VUs take the lowest free ids. Removed VUs (highest ids first) finish their current
    /// iteration and are aborted if they are still running after the graceful ramp-down period.
    pub fn set_vus(&mut self, count: usize) {
        if self.active.len() == count {
            return;
        }

        if self.active.len() > count {
            let deadline = Instant::now() + self.graceful_ramp_down;
            for vu in self.active.drain(count..) {
                vu.stop.store(true, Ordering::Relaxed);
                self.retiring.push(RetiringVu { vu, deadline });
            }
        } else {
            while self.active.len() < count {
                let id = self.free_id();
                let vu = self.spawn(id);
                let pos = self.active.partition_point(|v| v.id < id);
                self.active.insert(pos, vu);
            }
        }

        self.max_vus = self.max_vus.max(self.active.len());
        trace!("VUs set to {}", self.active.len());

        #[cfg(feature = "metrics")]
        metrics::gauge!(fxload_core::VUS_METRIC).set(self.active.len() as f64);
    }

    /// Drop retired VUs which have finished and abort those past their deadline.
    pub fn reap(&mut self) {
        let now = Instant::now();
        let interrupted = &self.task_atomics.interrupted;
        self.retiring.retain(|r| {
            if r.vu.handle.is_finished() {
                false
            } else if now >= r.deadline {
                debug!("Interrupting VU {} after graceful ramp-down.", r.vu.id);
                r.vu.handle.abort();
                interrupted.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
    }

    /// Ask every VU to stop after its current iteration and wait for them, up to `graceful_stop`.
    pub async fn shutdown(&mut self, graceful_stop: Duration) {
        let deadline = Instant::now() + graceful_stop;
        for vu in self.active.drain(..) {
            vu.stop.store(true, Ordering::Relaxed);
            self.retiring.push(RetiringVu { vu, deadline });
        }

        for mut r in self.retiring.drain(..) {
            let deadline = r.deadline.min(deadline);
            if tokio::time::timeout_at(deadline, &mut r.vu.handle)
                .await
                .is_err()
            {
                debug!("Interrupting VU {} after graceful stop.", r.vu.id);
                r.vu.handle.abort();
                self.task_atomics
                    .interrupted
                    .fetch_add(1, Ordering::Relaxed);
            }
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!(fxload_core::VUS_METRIC).set(0.);
    }

    pub fn collect(&self, elapsed: Duration, samples: &mut SampleSet) -> Measurement {
        self.task_atomics
            .collect(elapsed, self.active.len(), samples)
    }

    pub fn active(&self) -> usize {
        self.active.len()
    }

    pub fn max_vus(&self) -> usize {
        self.max_vus
    }

    pub fn iterations(&self) -> u64 {
        self.task_atomics.iterations()
    }

    pub fn interrupted(&self) -> u64 {
        self.task_atomics.interrupted()
    }

    pub fn checks(&self) -> &CheckRegistry {
        &self.checks
    }

    fn free_id(&self) -> usize {
        (1..)
            .find(|id| {
                !self.active.iter().any(|v| v.id == *id)
                    && !self.retiring.iter().any(|r| r.vu.id == *id)
            })
            .unwrap_or(self.active.len() + self.retiring.len() + 1)
    }

    fn spawn(&mut self, id: usize) -> Vu {
        while self.next_iterations.len() < id {
            self.next_iterations.push(Arc::new(AtomicU64::new(0)));
        }

        // Claimed when an iteration starts, so an interrupted iteration is never handed out again
        let next_iteration = self.next_iterations[id - 1].clone();
        let iteration = Arc::new(AtomicU64::new(next_iteration.load(Ordering::Relaxed)));
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = VuContext {
            id,
            iteration: iteration.clone(),
            checks: self.checks.clone(),
        };

        let scenario = self.scenario.clone();
        let transaction_data = self.task_atomics.clone_to_transaction_data();
        let iterations = self.task_atomics.iterations.clone();
        let task_stop = stop.clone();

        let handle = tokio::spawn(VU.scope(
            ctx,
            TRANSACTION_HOOK.scope(transaction_data, async move {
                while !task_stop.load(Ordering::Relaxed) {
                    let current = next_iteration.fetch_add(1, Ordering::Relaxed);
                    iteration.store(current, Ordering::Relaxed);

                    let start = Instant::now();
                    scenario().await;
                    iterations.fetch_add(1, Ordering::Relaxed);

                    #[cfg(feature = "metrics")]
                    {
                        metrics::counter!(fxload_core::ITERATIONS_METRIC).increment(1);
                        metrics::histogram!(fxload_core::ITERATION_DURATION_METRIC)
                            .record(start.elapsed().as_secs_f64());
                    }
                    #[cfg(not(feature = "metrics"))]
                    let _ = start;
                }
            }),
        ));

        Vu { id, stop, handle }
    }
}

impl<T> Drop for VuPool<T> {
    fn drop(&mut self) {
        for vu in &self.active {
            vu.handle.abort();
        }
        for r in &self.retiring {
            r.vu.handle.abort();
        }
    }
}
