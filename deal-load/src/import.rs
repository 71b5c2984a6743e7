use crate::deal::Deal;
use fxload::prelude::*;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_URL: &str = "http://localhost:8080/api/v1/deals/import";

pub const STATUS_CHECK: &str = "status is 201";
pub const SUCCESS_COUNT_CHECK: &str = "successCount is 1";

/// Body of an import response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success_count: u32,
    pub failure_count: u32,
    #[serde(default)]
    pub failures: Vec<FailedDeal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDeal {
    pub deal_id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ImportResponse {
    pub status: StatusCode,
    /// `None` when the body was not an import result
    pub result: Option<ImportResult>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unable to serialize deals: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Import answered {0}")]
    Status(StatusCode),
}

/// POST `deals` to the import endpoint.
///
/// Transport errors and `4xx`/`5xx` answers are failed requests; anything else is returned with
/// its decoded body for checking.
#[transaction]
pub async fn post_deals(
    client: &Client,
    url: &str,
    deals: &[Deal],
) -> Result<ImportResponse, ImportError> {
    let body = serde_json::to_vec(deals)?;
    let res = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = res.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(ImportError::Status(status));
    }

    let result = res.json::<ImportResult>().await.ok();
    Ok(ImportResponse { status, result })
}

/// Record the two response checks. Returns true when both passed.
pub fn check_response(res: &Result<ImportResponse, ImportError>) -> bool {
    let (created, imported_one) = match res {
        Ok(res) => (
            res.status == StatusCode::CREATED,
            res.result.as_ref().is_some_and(|r| r.success_count == 1),
        ),
        Err(_) => (false, false),
    };

    let created = check(STATUS_CHECK, created);
    let imported_one = check(SUCCESS_COUNT_CHECK, imported_one);
    created && imported_one
}
