// handlers/protected/ai.rs - POST /api/ai/parse-price-list

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::handlers::require_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/ai/parse-price-list", post(parse_price_list_post))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub text: String,
}

/// Turns a pasted supplier price list into structured rows.
pub async fn parse_price_list_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ParseRequest>,
) -> ApiResult<Value> {
    require_fields(&[("text", body.text.as_str())])?;

    let parsed = state.price_lists.parse(&body.text).await?;
    info!(
        "{} parsed a price list into {} item(s)",
        user.email,
        parsed.as_array().map_or(0, Vec::len)
    );
    Ok(ApiResponse::success(parsed))
}
