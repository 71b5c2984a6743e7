use crate::deal::{Deal, DealRequest, FailedDeal, ImportResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate deal: Deal with ID {0} already exists.")]
    Duplicate(String),
}

/// In-memory deal storage keyed by unique id.
#[derive(Debug, Default)]
pub struct DealStore {
    deals: RwLock<HashMap<String, Deal>>,
}

impl DealStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.deals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.deals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn insert(&self, deal: Deal) -> Result<(), StoreError> {
        let mut deals = self.deals.write().unwrap_or_else(PoisonError::into_inner);
        insert_into(&mut deals, deal)
    }

    /// Validate and store every deal of a batch, in order. A deal failing either step is
    /// reported without affecting the others; a repeated id within the batch is a duplicate.
    pub fn import(&self, requests: Vec<DealRequest>, now: OffsetDateTime) -> ImportResult {
        let mut result = ImportResult {
            success_count: 0,
            failure_count: 0,
            failures: vec![],
        };

        let mut deals = self.deals.write().unwrap_or_else(PoisonError::into_inner);
        for request in requests {
            let outcome = request
                .validate(now)
                .and_then(|deal| insert_into(&mut deals, deal).map_err(|e| e.to_string()));

            match outcome {
                Ok(()) => result.success_count += 1,
                Err(error) => {
                    debug!("Rejected deal {:?}: {error}", request.deal_unique_id);
                    result.failure_count += 1;
                    result.failures.push(FailedDeal {
                        deal_id: request.deal_unique_id,
                        error,
                    });
                }
            }
        }

        result
    }
}

fn insert_into(deals: &mut HashMap<String, Deal>, deal: Deal) -> Result<(), StoreError> {
    if deals.contains_key(&deal.deal_unique_id) {
        return Err(StoreError::Duplicate(deal.deal_unique_id));
    }
    deals.insert(deal.deal_unique_id.clone(), deal);
    Ok(())
}
