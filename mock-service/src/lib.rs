//! A stand-in for the FX deals import service, used as a target for `deal-load`.
mod deal;
mod store;

pub use deal::{Deal, DealRequest, FailedDeal, ImportResult};
pub use store::{DealStore, StoreError};

use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::Serialize;
use std::{
    future::Future,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const IMPORT_PATH: &str = "/api/v1/deals/import";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unable to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Added to every import before it is processed
    pub delay: Duration,
    /// Requests above this rate are answered with `429`
    pub max_tps: Option<NonZeroU32>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DealStore>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    delay: Duration,
    requests: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            store: Arc::new(DealStore::new()),
            limiter: config.max_tps.map(|tps| Arc::new(rate_limiter(tps))),
            delay: config.delay,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorBody {
        error: status.canonical_reason().unwrap_or("Error"),
        message,
    };
    (status, Json(body)).into_response()
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(IMPORT_PATH, post(import_deals))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[debug_handler]
async fn import_deals(
    State(state): State<AppState>,
    payload: Result<Json<Vec<DealRequest>>, JsonRejection>,
) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    counter!("mock_service_requests").increment(1);

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!("Rate limited");
            counter!("mock_service_rate_limited").increment(1);
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Request rate exceeded".to_string(),
            );
        }
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let Json(requests) = match payload {
        Ok(payload) => payload,
        Err(JsonRejection::MissingJsonContentType(rejection)) => {
            return error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, rejection.body_text());
        }
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "Request body is malformed or has incorrect data types. {}",
                    rejection.body_text()
                ),
            );
        }
    };

    let result = state.store.import(requests, OffsetDateTime::now_utc());
    counter!("mock_service_deals_imported").increment(result.success_count as u64);
    counter!("mock_service_deals_failed").increment(result.failure_count as u64);

    (StatusCode::CREATED, Json(result)).into_response()
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}

/// Serve the import endpoint on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServiceError> {
    serve_with_shutdown(listener, state, std::future::pending()).await
}

/// Like [`serve`], returning once `shutdown` completes and in-flight requests are answered.
pub async fn serve_with_shutdown<S>(
    listener: TcpListener,
    state: AppState,
    shutdown: S,
) -> Result<(), ServiceError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let tps_printer = tokio::spawn(tps_measure_task(state.requests.clone()));
    let res = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await;
    tps_printer.abort();
    res?;
    Ok(())
}

pub async fn run(addr: SocketAddr, config: ServiceConfig) -> Result<(), ServiceError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind { addr, source })?;
    info!("Listening on {addr} with {config:?}");
    serve(listener, AppState::new(&config)).await
}

/** TPS Printer **/

async fn tps_measure_task(requests: Arc<AtomicU64>) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let transactions = requests.swap(0, Ordering::Relaxed);
        if transactions > 0 {
            info!("{transactions} TPS");
        }
    }
}
