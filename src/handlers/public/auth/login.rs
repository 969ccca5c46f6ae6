// handlers/public/auth/login.rs - POST /api/auth/login

use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use super::{issue_token, normalize_email, TokenResponse};
use crate::auth::{verify_password, AuthError};
use crate::database::models::user::User;
use crate::handlers::require_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login - `{ email, password }` -> `{ token, user }`; bad credentials -> 401.
pub async fn login_post(State(state): State<AppState>, ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<TokenResponse> {
    require_fields(&[("email", body.email.as_str()), ("password", body.password.as_str())])?;

    let email = normalize_email(&body.email);
    let Some(user) = User::find_by_email(state.db.pool(), &email).await? else {
        warn!("Login attempt for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if let Err(e) = verify_password(&body.password, &user.password_hash) {
        warn!("Failed login for {}", user.email);
        return Err(e.into());
    }

    info!("{} logged in", user.email);
    Ok(ApiResponse::success(issue_token(&user, &state.config)?))
}
