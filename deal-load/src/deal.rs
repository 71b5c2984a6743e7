use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

pub const DEFAULT_ID_PREFIX: &str = "load";
pub const DEFAULT_FROM_CURRENCY: &str = "USD";
pub const DEFAULT_TO_CURRENCY: &str = "JPY";
pub const DEFAULT_AMOUNT_BASE: f64 = 1000.;
pub const DEFAULT_AMOUNT_SPREAD: f64 = 100.;

/// One FX deal as accepted by the import endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub deal_unique_id: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(with = "time::serde::rfc3339")]
    pub deal_timestamp: OffsetDateTime,
    pub deal_amount: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("Deal id prefix cannot be empty")]
    EmptyPrefix,

    #[error("Invalid currency code `{0}`, expected 3 ASCII letters")]
    InvalidCurrency(String),

    #[error("Invalid amount range [{base}, {base} + {spread})")]
    InvalidAmountRange { base: f64, spread: f64 },
}

/// What every generated deal looks like. Amounts are drawn uniformly from
/// `[amount_base, amount_base + amount_spread)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadConfig {
    pub id_prefix: String,
    pub from_currency: String,
    pub to_currency: String,
    pub amount_base: f64,
    pub amount_spread: f64,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            from_currency: DEFAULT_FROM_CURRENCY.to_string(),
            to_currency: DEFAULT_TO_CURRENCY.to_string(),
            amount_base: DEFAULT_AMOUNT_BASE,
            amount_spread: DEFAULT_AMOUNT_SPREAD,
        }
    }
}

impl PayloadConfig {
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.id_prefix.is_empty() {
            return Err(PayloadError::EmptyPrefix);
        }

        for currency in [&self.from_currency, &self.to_currency] {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(PayloadError::InvalidCurrency(currency.clone()));
            }
        }

        if !(self.amount_base.is_finite()
            && self.amount_spread.is_finite()
            && self.amount_base > 0.
            && self.amount_spread > 0.)
        {
            return Err(PayloadError::InvalidAmountRange {
                base: self.amount_base,
                spread: self.amount_spread,
            });
        }

        Ok(())
    }
}

/// The id of the deal posted by `vu` on its `iteration`.
pub fn deal_id(prefix: &str, vu: usize, iteration: u64) -> String {
    format!("{prefix}-{vu}-{iteration}")
}

/// Build the body of one import request: a single deal.
pub fn generate_payload(vu: usize, iteration: u64, config: &PayloadConfig) -> Vec<Deal> {
    generate_payload_with(&mut rand::thread_rng(), vu, iteration, config)
}

pub fn generate_payload_with<R: Rng + ?Sized>(
    rng: &mut R,
    vu: usize,
    iteration: u64,
    config: &PayloadConfig,
) -> Vec<Deal> {
    let low = config.amount_base;
    let high = config.amount_base + config.amount_spread;

    vec![Deal {
        deal_unique_id: deal_id(&config.id_prefix, vu, iteration),
        from_currency: config.from_currency.clone(),
        to_currency: config.to_currency.clone(),
        deal_timestamp: OffsetDateTime::now_utc(),
        deal_amount: rng.gen_range(low..high),
    }]
}
