/// Metric names recorded by a `#[transaction]`.
#[derive(Copy, Clone, Debug)]
pub struct TransactionLabels {
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
}

/// Counter incremented for every recorded check, labelled with `check` and `result`.
pub const CHECKS_METRIC: &str = "fxload_checks";

/// Gauge of the number of VUs currently running.
pub const VUS_METRIC: &str = "fxload_vus";

/// Counter of completed iterations.
pub const ITERATIONS_METRIC: &str = "fxload_iterations";

/// Histogram of iteration durations, in seconds.
pub const ITERATION_DURATION_METRIC: &str = "fxload_iteration_duration";

#[macro_export]
macro_rules! generate_labels {
    ($base_name:expr) => {
        ::fxload::core::TransactionLabels {
            success: concat!(stringify!($base_name), "_success"),
            error: concat!(stringify!($base_name), "_error"),
            latency: concat!(stringify!($base_name), "_latency"),
        }
    };
}
