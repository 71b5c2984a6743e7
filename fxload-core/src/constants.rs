use std::time::Duration;

/// VUs running when the first stage begins
pub const DEFAULT_START_VUS: usize = 1;

/// How long a VU removed during a ramp-down may keep running its current iteration
pub const DEFAULT_GRACEFUL_RAMP_DOWN: Duration = Duration::from_secs(30);

/// How long in-flight iterations may run after the last stage ends
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Interval at which the VU pool is resized to follow the schedule
pub const SCHEDULE_TICK: Duration = Duration::from_millis(100);

/// Interval at which measurements are collected and logged
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Number of samples used for the rolling TPS / error rate reported while running
pub const SAMPLE_WINDOW_SIZE: usize = 10;
