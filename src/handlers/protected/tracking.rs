// handlers/protected/tracking.rs - POST /api/tracking/:mode (events | first | last)

use axum::{
    extract::{Path, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::carrier::TrackingMode;
use crate::state::AppState;

pub const MAX_OBJECTS: usize = 50;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/tracking/:mode", post(track_post))
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(default)]
    pub objects: Vec<String>,
}

/// Relays the carrier's response body as-is.
pub async fn track_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(mode): Path<String>,
    ApiJson(body): ApiJson<TrackRequest>,
) -> ApiResult<Value> {
    let mode = TrackingMode::from_segment(&mode)
        .ok_or_else(|| ApiError::not_found(format!("Unknown tracking mode '{}'", mode)))?;
    let objects = tracking_codes(body.objects)?;

    info!("{} tracking {} object(s) ({:?})", user.email, objects.len(), mode);
    let result = state.carrier.track(&objects, mode).await?;
    Ok(ApiResponse::success(result))
}

fn tracking_codes(objects: Vec<String>) -> Result<Vec<String>, ApiError> {
    let codes: Vec<String> = objects
        .into_iter()
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect();

    if codes.is_empty() {
        return Err(ApiError::bad_request("At least one tracking code is required"));
    }
    if codes.len() > MAX_OBJECTS {
        return Err(ApiError::bad_request(format!(
            "At most {} tracking codes per request",
            MAX_OBJECTS
        )));
    }
    Ok(codes)
}
