use crate::deal::{PayloadConfig, DEFAULT_AMOUNT_BASE, DEFAULT_AMOUNT_SPREAD};
use crate::import::DEFAULT_URL;
use clap::Parser;
use fxload::{ScenarioConfig, Stage};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_LOG_FILTER: &str = "deal_load=info,fxload=info";

/// Staged load test for the FX deal import endpoint.
///
/// Ramps virtual users through the given stages; every VU repeatedly posts one synthetic deal,
/// checks for `201 Created` with `successCount == 1`, then waits for the think time.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Import endpoint
    #[arg(long, env = "DEAL_LOAD_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Ramp stage as `<duration>:<target VUs>`, repeat or comma separate for several
    #[arg(
        long = "stage",
        env = "DEAL_LOAD_STAGES",
        value_delimiter = ',',
        default_values_t = default_stages()
    )]
    pub stages: Vec<Stage>,

    /// VUs running when the first stage starts
    #[arg(long, env = "DEAL_LOAD_START_VUS", default_value_t = fxload::core::DEFAULT_START_VUS)]
    pub start_vus: usize,

    /// Pause at the end of every iteration
    #[arg(long, env = "DEAL_LOAD_THINK_TIME", default_value = "1s")]
    pub think_time: humantime::Duration,

    /// Cap on requests per second across all VUs
    #[arg(long, env = "DEAL_LOAD_MAX_TPS")]
    pub max_tps: Option<NonZeroU32>,

    /// How long a VU removed during a ramp-down may finish its iteration
    #[arg(long, env = "DEAL_LOAD_GRACEFUL_RAMP_DOWN", default_value = "30s")]
    pub graceful_ramp_down: humantime::Duration,

    /// How long running iterations may take to finish after the last stage
    #[arg(long, env = "DEAL_LOAD_GRACEFUL_STOP", default_value = "30s")]
    pub graceful_stop: humantime::Duration,

    /// Prefix of generated deal ids (`<prefix>-<vu>-<iteration>`)
    #[arg(long, env = "DEAL_LOAD_ID_PREFIX", default_value = crate::deal::DEFAULT_ID_PREFIX)]
    pub id_prefix: String,

    /// Source currency of generated deals
    #[arg(long, env = "DEAL_LOAD_FROM", default_value = crate::deal::DEFAULT_FROM_CURRENCY)]
    pub from: String,

    /// Destination currency of generated deals
    #[arg(long, env = "DEAL_LOAD_TO", default_value = crate::deal::DEFAULT_TO_CURRENCY)]
    pub to: String,

    /// Timeout of a single import request
    #[arg(long, env = "DEAL_LOAD_REQUEST_TIMEOUT", default_value = "10s")]
    pub request_timeout: humantime::Duration,

    /// Serve Prometheus metrics on this address while running
    #[arg(long, env = "DEAL_LOAD_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Exit with an error when any check failed
    #[arg(long, env = "DEAL_LOAD_STRICT")]
    pub strict: bool,
}

pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::new(Duration::from_secs(30), 20),
        Stage::new(Duration::from_secs(60), 20),
        Stage::new(Duration::from_secs(10), 0),
    ]
}

impl Cli {
    pub fn scenario_config(&self) -> ScenarioConfig {
        let mut config = ScenarioConfig::new("import_deals");
        config.stages = self.stages.clone();
        config.start_vus = self.start_vus;
        config.graceful_ramp_down = self.graceful_ramp_down.into();
        config.graceful_stop = self.graceful_stop.into();
        config.max_tps = self.max_tps;
        config
    }

    pub fn payload_config(&self) -> PayloadConfig {
        PayloadConfig {
            id_prefix: self.id_prefix.clone(),
            from_currency: self.from.clone(),
            to_currency: self.to.clone(),
            amount_base: DEFAULT_AMOUNT_BASE,
            amount_spread: DEFAULT_AMOUNT_SPREAD,
        }
    }
}
