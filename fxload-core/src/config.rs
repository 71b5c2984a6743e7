use crate::{
    ConfigError, Stage, StageSchedule, DEFAULT_GRACEFUL_RAMP_DOWN, DEFAULT_GRACEFUL_STOP,
    DEFAULT_START_VUS,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Everything a scenario run needs besides the scenario function itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub stages: Vec<Stage>,
    pub start_vus: usize,
    #[serde(with = "crate::stage::humantime_str")]
    pub graceful_ramp_down: Duration,
    #[serde(with = "crate::stage::humantime_str")]
    pub graceful_stop: Duration,
    pub max_tps: Option<NonZeroU32>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stages: vec![],
            start_vus: DEFAULT_START_VUS,
            graceful_ramp_down: DEFAULT_GRACEFUL_RAMP_DOWN,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
            max_tps: None,
        }
    }

    pub fn schedule(&self) -> Result<StageSchedule, ConfigError> {
        StageSchedule::new(self.start_vus, self.stages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ScenarioConfig::new("deals");
        assert_eq!(config.name, "deals");
        assert_eq!(config.start_vus, 1);
        assert_eq!(config.graceful_stop, Duration::from_secs(30));
        assert!(config.max_tps.is_none());
        assert_eq!(config.schedule().unwrap_err(), ConfigError::NoStages);
    }

    #[test]
    fn from_json_with_missing_fields() {
        let config: ScenarioConfig = serde_json::from_str(
            r#"{
                "name": "deals",
                "stages": [{"duration": "30s", "target": 20}, {"duration": "10s", "target": 0}],
                "graceful_stop": "5s"
            }"#,
        )
        .unwrap();

        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.graceful_stop, Duration::from_secs(5));
        assert_eq!(config.graceful_ramp_down, Duration::from_secs(30));
        assert_eq!(config.schedule().unwrap().total_duration(), Duration::from_secs(40));
    }
}
