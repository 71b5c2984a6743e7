use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("A scenario needs at least one stage")]
    NoStages,

    #[error("Invalid stage `{0}`, expected `<duration>:<target>` (e.g. `30s:20`)")]
    MalformedStage(String),

    #[error("Invalid stage duration `{input}`: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("Invalid stage target `{0}`, expected a non-negative VU count")]
    InvalidTarget(String),
}
