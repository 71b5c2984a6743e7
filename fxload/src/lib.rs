#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod check;
pub mod scenario;
#[doc(hidden)]
pub mod transaction;
pub mod vu;

pub(crate) mod measurement;
pub(crate) mod task_atomics;
pub(crate) mod timer;

#[doc(hidden)]
pub use fxload_core as core;

pub use check::check;
pub use fxload_core::{parse_stages, CheckSummary, RunStatistics, ScenarioConfig, Stage};
pub use fxload_macros::{scenario, transaction};
pub use scenario::Scenario;

pub mod prelude {
    pub use crate::check::check;
    pub use crate::scenario::ConfigurableScenario;
    pub use fxload_core::{RunStatistics, Stage};
    pub use fxload_macros::{scenario, transaction};
    pub use std::num::NonZeroU32;
}
