use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A single ramp segment: over `duration`, move the number of running VUs linearly towards
/// `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "humantime_str")]
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// Parses stages in the `<duration>:<target>` form, e.g. `30s:20` or `1m30s:5`.
impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (duration, target) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::MalformedStage(s.to_string()))?;

        let duration = duration.trim();
        if duration.is_empty() {
            return Err(ConfigError::MalformedStage(s.to_string()));
        }

        let duration =
            humantime::parse_duration(duration).map_err(|e| ConfigError::InvalidDuration {
                input: duration.to_string(),
                reason: e.to_string(),
            })?;

        let target = target
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidTarget(target.trim().to_string()))?;

        Ok(Self { duration, target })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            humantime::format_duration(self.duration),
            self.target
        )
    }
}

/// Parse a comma separated list of stages, e.g. `30s:20,1m:20,10s:0`.
pub fn parse_stages(s: &str) -> Result<Vec<Stage>, ConfigError> {
    let stages = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Stage::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if stages.is_empty() {
        Err(ConfigError::NoStages)
    } else {
        Ok(stages)
    }
}

/// The VU count over time described by a list of stages.
///
/// Between stage boundaries the count follows a straight line from the previous target (or the
/// starting VUs) to the stage's target. A rising line is rounded down and a falling one rounded
/// up, so a VU is only added or removed once the line actually crosses the next integer.
#[derive(Clone, Debug)]
pub struct StageSchedule {
    start_vus: usize,
    stages: Vec<Stage>,
}

impl StageSchedule {
    pub fn new(start_vus: usize, stages: Vec<Stage>) -> Result<Self, ConfigError> {
        if stages.is_empty() {
            return Err(ConfigError::NoStages);
        }

        Ok(Self { start_vus, stages })
    }

    /// Desired number of VUs `elapsed` into the run, or `None` once every stage has elapsed.
    pub fn target_at(&self, elapsed: Duration) -> Option<usize> {
        let mut from = self.start_vus;
        let mut stage_start = Duration::ZERO;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                return Some(interpolate(from, stage.target, progress));
            }

            from = stage.target;
            stage_start = stage_end;
        }

        None
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn max_target(&self) -> usize {
        self.stages
            .iter()
            .map(|s| s.target)
            .max()
            .unwrap_or(0)
            .max(self.start_vus)
    }

    pub fn start_vus(&self) -> usize {
        self.start_vus
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

fn interpolate(from: usize, to: usize, progress: f64) -> usize {
    let value = from as f64 + (to as f64 - from as f64) * progress;
    if to >= from {
        value.floor() as usize
    } else {
        value.ceil() as usize
    }
}

pub(crate) mod humantime_str {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(de::Error::custom)
    }
}
