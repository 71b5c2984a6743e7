use std::fmt;
use std::time::Duration;

/// Run Statistics for a given Scenario
///
/// Returned when a scenario completes. Holds request throughput and latency for all
/// transactions, iteration counts, and the outcome of every check recorded during the run.
#[derive(Clone, Debug, Default)]
pub struct RunStatistics {
    pub elapsed: Duration,
    pub iterations: u64,
    pub interrupted_iterations: u64,
    pub max_vus: usize,
    pub requests: u64,
    pub tps: f64,
    pub error_rate: f64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p95: Duration,
    pub latency_p99: Duration,
    pub checks: Vec<CheckSummary>,
}

impl RunStatistics {
    /// True when no check failed. A run without checks passes.
    pub fn checks_passed(&self) -> bool {
        self.checks.iter().all(|c| c.fails == 0)
    }

    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn pass_rate(&self) -> f64 {
        let total = self.passes + self.fails;
        if total == 0 {
            0.
        } else {
            self.passes as f64 / total as f64
        }
    }
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.fails == 0 { "✓" } else { "✗" };
        write!(
            f,
            "{mark} {} ({:.2}% passed, {} / {} failed)",
            self.name,
            self.pass_rate() * 100.,
            self.fails,
            self.passes + self.fails
        )
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        writeln!(
            f,
            "  requests: {} ({:.2}/s), failed: {:.2}%",
            self.requests,
            self.tps,
            self.error_rate * 100.
        )?;
        writeln!(
            f,
            "  latency: p50={:?} p90={:?} p95={:?} p99={:?}",
            self.latency_p50, self.latency_p90, self.latency_p95, self.latency_p99
        )?;
        write!(
            f,
            "  iterations: {} ({} interrupted), max VUs: {}, duration: {}",
            self.iterations,
            self.interrupted_iterations,
            self.max_vus,
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64))
        )
    }
}
