use crate::deal::{generate_payload, PayloadConfig, PayloadError};
use crate::import::{check_response, post_deals};
use fxload::prelude::*;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

static SCRIPT: OnceLock<DealScript> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("A deal script is already installed")]
    AlreadyInstalled,
}

/// Everything one iteration needs: where to post, what to post, and how long to pause after.
#[derive(Debug, Clone)]
pub struct DealScript {
    client: Client,
    url: String,
    payload: PayloadConfig,
    think_time: Duration,
}

impl DealScript {
    pub fn new(
        url: impl Into<String>,
        payload: PayloadConfig,
        think_time: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ScriptError> {
        payload.validate()?;
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            payload,
            think_time,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build payload, POST it, check the answer, pause. Returns whether both checks passed.
    pub async fn run_iteration(&self, vu: usize, iteration: u64) -> bool {
        let deals = generate_payload(vu, iteration, &self.payload);
        let res = post_deals(&self.client, &self.url, &deals).await;
        if let Err(err) = &res {
            debug!(vu, iteration, "Import failed: {err}");
        }

        let passed = check_response(&res);
        tokio::time::sleep(self.think_time).await;
        passed
    }
}

/// Make `script` the one run by [`import_deals`]. Only one script can be installed per process.
pub fn install(script: DealScript) -> Result<&'static DealScript, ScriptError> {
    SCRIPT
        .set(script)
        .map_err(|_| ScriptError::AlreadyInstalled)?;
    SCRIPT.get().ok_or(ScriptError::AlreadyInstalled)
}

/// One VU iteration against the installed [`DealScript`].
#[scenario]
pub async fn import_deals() {
    match SCRIPT.get() {
        Some(script) => {
            let vu = fxload::vu::id().unwrap_or_default();
            let iteration = fxload::vu::iteration().unwrap_or_default();
            script.run_iteration(vu, iteration).await;
        }
        None => {
            error!("No deal script installed, call `deal_load::install` first.");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_payload_config() {
        let payload = PayloadConfig {
            from_currency: "US".to_string(),
            ..Default::default()
        };
        let err = DealScript::new(
            "http://localhost:1/api/v1/deals/import",
            payload,
            Duration::ZERO,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Payload(PayloadError::InvalidCurrency(_))));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn unreachable_target_fails_checks() {
        // Port 1 is never listening in the test environment
        let script = DealScript::new(
            "http://127.0.0.1:1/api/v1/deals/import",
            PayloadConfig::default(),
            Duration::ZERO,
            Duration::from_secs(1),
        )
        .unwrap();

        assert!(!script.run_iteration(1, 0).await);
        assert!(logs_contain("Import failed"));
    }
}
