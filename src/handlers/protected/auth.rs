// handlers/protected/auth.rs - GET /api/auth/me

use axum::{extract::State, routing::get, Router};
use serde::Serialize;

use crate::database::models::organization::Organization;
use crate::database::models::user::{PublicUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me_get))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
    pub organization: Option<Organization>,
}

/// The token's principal, re-read from the store. A token whose account has
/// since been removed is treated as unauthenticated.
pub async fn me_get(State(state): State<AppState>, user: AuthUser) -> ApiResult<MeResponse> {
    let account = User::find_by_id(state.db.pool(), &user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;
    let organization = Organization::find(state.db.pool(), &account.organization_id).await?;

    Ok(ApiResponse::success(MeResponse {
        user: account.public(),
        organization,
    }))
}
