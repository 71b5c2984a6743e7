//! Scenario logic and constants
use crate::timer::Timer;
use crate::vu::VuPool;
use fxload_core::{
    RunStatistics, SampleSet, ScenarioConfig, Stage, SAMPLE_INTERVAL, SAMPLE_WINDOW_SIZE,
    SCHEDULE_TICK,
};
use std::{
    future::Future,
    num::NonZeroU32,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::{interval, Instant, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Load test scenario structure
///
/// Handler for running scenarios. Not intended for manual creation, use the [`#[scenario]`](fxload_macros::scenario) macro which will add these methods to functions.
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunStatistics> + Send>>>,
    config: ScenarioConfig,
}

impl<T> Scenario<T> {
    #[doc(hidden)]
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
        }
    }
}

impl<T, F> Future for Scenario<T>
where
    T: Fn() -> F + Send + 'static + Clone + Sync,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = RunStatistics;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let func = self.func.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move { run_scenario(func, config).await }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn stages(self, stages: Vec<Stage>) -> Self;
    fn stage(self, duration: Duration, target: usize) -> Self;
    fn start_vus(self, start_vus: usize) -> Self;
    fn graceful_ramp_down(self, duration: Duration) -> Self;
    fn graceful_stop(self, duration: Duration) -> Self;
    fn tps(self, tps: NonZeroU32) -> Self;
    fn config(self, config: ScenarioConfig) -> Self;
}

impl<T, F> ConfigurableScenario<RunStatistics> for Scenario<T>
where
    T: Fn() -> F + Send + 'static + Clone + Sync,
    F: Future<Output = ()> + Send + 'static,
{
    /// Replace the stages of the scenario.
    ///
    /// # Example
    /// ```no_run
    /// use fxload::prelude::*;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let stages = fxload::parse_stages("30s:20,1m:20,10s:0").unwrap();
    ///     my_scenario()
    ///         .stages(stages)
    ///         .await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn stages(mut self, stages: Vec<Stage>) -> Self {
        self.config.stages = stages;
        self
    }

    /// Append a stage ramping linearly to `target` VUs over `duration`.
    ///
    /// # Example
    /// ```no_run
    /// use fxload::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     my_scenario()
    ///         .stage(Duration::from_secs(30), 20)
    ///         .stage(Duration::from_secs(60), 20)
    ///         .stage(Duration::from_secs(10), 0)
    ///         .await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn stage(mut self, duration: Duration, target: usize) -> Self {
        self.config.stages.push(Stage::new(duration, target));
        self
    }

    /// Number of VUs running when the first stage starts (default 1).
    fn start_vus(mut self, start_vus: usize) -> Self {
        self.config.start_vus = start_vus;
        self
    }

    /// How long a VU removed by a ramp-down may finish its iteration before being interrupted
    /// (default 30s).
    fn graceful_ramp_down(mut self, duration: Duration) -> Self {
        self.config.graceful_ramp_down = duration;
        self
    }

    /// How long running iterations may take to finish once the last stage ends (default 30s).
    fn graceful_stop(mut self, duration: Duration) -> Self {
        self.config.graceful_stop = duration;
        self
    }

    /// Cap the rate of transactions across all VUs.
    ///
    /// # Example
    /// ```no_run
    /// use fxload::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     my_scenario()
    ///         .stage(Duration::from_secs(60), 50)
    ///         .tps(NonZeroU32::new(100).unwrap())
    ///         .await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn tps(mut self, tps: NonZeroU32) -> Self {
        self.config.max_tps = Some(tps);
        self
    }

    /// Replace the whole configuration, keeping the scenario's name if the new one has none.
    fn config(mut self, mut config: ScenarioConfig) -> Self {
        if config.name.is_empty() {
            config.name = std::mem::take(&mut self.config.name);
        }
        self.config = config;
        self
    }
}

#[instrument(name="scenario", skip_all, fields(name=config.name))]
pub(crate) async fn run_scenario<T, F>(scenario: T, config: ScenarioConfig) -> RunStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    let schedule = match config.schedule() {
        Ok(schedule) => schedule,
        Err(err) => {
            error!("Unable to run {}: {err}", config.name);
            return RunStatistics::default();
        }
    };

    info!(
        "Running {} for {} (up to {} VUs) with config {:?}",
        config.name,
        humantime::format_duration(schedule.total_duration()),
        schedule.max_target(),
        &config
    );

    let start = Instant::now();
    let mut pool = VuPool::new(scenario, &config);
    let mut samples = SampleSet::new(SAMPLE_WINDOW_SIZE);

    let mut schedule_tick = interval(SCHEDULE_TICK);
    schedule_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut timer = Timer::new(SAMPLE_INTERVAL).await;
    debug!("Sampling every {timer}");

    // NOTE: The first tick of `schedule_tick` completes immediately, which spawns the starting VUs.
    loop {
        tokio::select! {
            _ = schedule_tick.tick() => {
                match schedule.target_at(start.elapsed()) {
                    Some(target) => {
                        pool.set_vus(target);
                        pool.reap();
                    }
                    None => break,
                }
            }
            elapsed = timer.tick() => {
                let measurement = pool.collect(elapsed, &mut samples);
                info!("{measurement}");
                trace!(
                    "Rolling TPS={:.2}, ErrorRate={:.2}",
                    samples.mean_tps(),
                    samples.mean_err()
                );
            }
        }
    }

    info!(
        "Stages complete, waiting up to {} for VUs to finish",
        humantime::format_duration(config.graceful_stop)
    );
    pool.shutdown(config.graceful_stop).await;
    let _ = pool.collect(timer.since_last_tick(), &mut samples);

    let stats = RunStatistics {
        elapsed: start.elapsed(),
        iterations: pool.iterations(),
        interrupted_iterations: pool.interrupted(),
        max_vus: pool.max_vus(),
        requests: samples.total_requests(),
        tps: samples.total_tps(),
        error_rate: samples.total_error_rate(),
        latency_p50: samples.latency(0.5),
        latency_p90: samples.latency(0.9),
        latency_p95: samples.latency(0.95),
        latency_p99: samples.latency(0.99),
        checks: pool.checks().summaries(),
    };

    info!("Scenario complete");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use crate::transaction::transaction_hook;
    use fxload_core::TransactionLabels;

    const LABELS: TransactionLabels = TransactionLabels {
        success: "",
        error: "",
        latency: "",
    };

    fn scenario<T, F>(func: T) -> Scenario<T>
    where
        T: Fn() -> F + Send + 'static + Clone + Sync,
        F: Future<Output = ()> + Send + 'static,
    {
        Scenario::new("test", func)
    }

    async fn request() {
        let res = transaction_hook::<_, u32, ()>(LABELS, async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(201)
        })
        .await;
        check("status is 201", res == Ok(201));
        check("always fails", false);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn empty_stages_return_immediately() {
        let stats = scenario(request).await;
        assert_eq!(stats.iterations, 0);
        assert!(stats.checks.is_empty());
        assert!(logs_contain("A scenario needs at least one stage"));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn runs_stages() {
        let stats = scenario(request)
            .start_vus(0)
            .stage(Duration::from_millis(300), 4)
            .stage(Duration::from_millis(500), 4)
            .stage(Duration::from_millis(200), 0)
            .graceful_stop(Duration::from_secs(1))
            .await;

        assert_eq!(stats.max_vus, 4);
        assert!(stats.iterations > 10);
        assert_eq!(stats.interrupted_iterations, 0);
        assert_eq!(stats.requests, stats.iterations);
        assert_eq!(stats.error_rate, 0.);
        assert!(stats.elapsed >= Duration::from_secs(1));
        assert!(stats.latency_p50 >= Duration::from_millis(4));

        let status = stats.check("status is 201").unwrap();
        assert_eq!(status.passes, stats.iterations);
        assert_eq!(status.fails, 0);
        assert_eq!(stats.check("always fails").unwrap().passes, 0);
        assert!(!stats.checks_passed());
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn graceful_stop_interrupts_long_iterations() {
        let stats = scenario(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
        .stage(Duration::from_millis(100), 2)
        .graceful_stop(Duration::from_millis(50))
        .await;

        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.interrupted_iterations, stats.max_vus as u64);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn tps_cap_limits_requests() {
        let stats = scenario(request)
            .stage(Duration::from_secs(1), 10)
            .tps(NonZeroU32::new(20).unwrap())
            .await;

        assert!(stats.requests <= 40, "requests: {}", stats.requests);
        assert!(stats.requests > 0);
    }

    #[test]
    fn config_keeps_name() {
        let mut config = ScenarioConfig::default();
        config.stages.push(Stage::new(Duration::from_secs(1), 1));
        let s = scenario(|| async {}).config(config);
        assert_eq!(s.config.name, "test");
        assert_eq!(s.config.stages.len(), 1);
    }
}
