//! HTTP surface of the bidder: `POST /bw_dsp` and `GET /health`.

use crate::bidder_logic::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lib_bidder::{BidOutcome, NoBidReason, StoreError};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Inbound bid request.
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    /// Minimum acceptable price for the slot.
    pub bid_floor: f64,
}

/// # Application Error
///
/// Failures that reach the boundary. "No bid" is not one of them.
#[derive(Debug)]
pub enum ApiError {
    /// Store or schema fault raised by the engine.
    Store(StoreError),
    /// The request missed its deadline.
    Timeout(StoreError),
}

impl ApiError {
    #[track_caller]
    fn timeout(after: Duration) -> Self {
        ApiError::Timeout(StoreError::unavailable(format!(
            "bid request timed out after {} ms",
            after.as_millis()
        )))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    /// Converts an `ApiError` into a 500 with `{status, msg}`.
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Store(e) => {
                error!(kind = %e.kind(), "Store error: {}", e);
                e
            }
            ApiError::Timeout(e) => {
                error!("Request timeout: {}", e);
                e
            }
        };
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (
            status,
            Json(json!({
                "status": status.as_u16(),
                "msg": err.diagnostic(),
            })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/bw_dsp", post(bid_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Answers one bid request.
///
/// 200 with `{ad_id, price}` when an ad clears the floor, 204 with an empty
/// body when nothing does (no eligible ads or floor not met alike), 500 on a
/// store fault or timeout. Malformed bodies are rejected by the `Json`
/// extractor before the engine runs.
async fn bid_handler(
    State(state): State<AppState>,
    Json(request): Json<BidRequest>,
) -> Result<Response, ApiError> {
    let outcome = tokio::time::timeout(state.request_timeout, state.engine.bid(request.bid_floor))
        .await
        .map_err(|_| ApiError::timeout(state.request_timeout))??;

    match outcome {
        BidOutcome::Won(bid) => {
            debug!(ad_id = %bid.ad_id, price = bid.price, bid_floor = request.bid_floor, "Bidding");
            Ok((StatusCode::OK, Json(bid)).into_response())
        }
        BidOutcome::NoBid(reason) => {
            match reason {
                NoBidReason::NoEligibleRecords => debug!("No bid: no eligible ads"),
                NoBidReason::BelowFloor { best_price, floor } => {
                    debug!(best_price, floor, "No bid: best price below floor")
                }
            }
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let Some(db) = &state.db else {
        return (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response();
    };
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "msg": e.to_string() })),
            )
                .into_response()
        }
    }
}
