// handlers/public/auth/register.rs - POST /api/auth/register

use axum::extract::State;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{issue_token, normalize_email, TokenResponse, MIN_PASSWORD_LENGTH};
use crate::auth::{hash_password, Role};
use crate::database::models::organization::Organization;
use crate::database::models::user::{NewUser, User};
use crate::error::ApiError;
use crate::handlers::require_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub organization_name: Option<String>,
}

/**
 * POST /api/auth/register - Create an organization and its first account
 *
 * Input:  { "email", "password", "name", "organizationName"? }
 * Output: 201 { "token", "user" }
 *
 * Duplicate email -> 409. Password shorter than six characters -> 400.
 */
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    require_fields(&[
        ("email", body.email.as_str()),
        ("password", body.password.as_str()),
        ("name", body.name.as_str()),
    ])?;
    if body.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let email = normalize_email(&body.email);
    if User::find_by_email(state.db.pool(), &email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let organization_name = body
        .organization_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}'s organization", body.name.trim()));
    let password_hash = hash_password(&body.password)?;

    let organization_id = Uuid::new_v4().to_string();
    let user_id = Uuid::new_v4().to_string();

    // Organization and first user commit together
    let mut tx = state.db.begin().await?;
    Organization::insert(&mut *tx, &organization_id, &organization_name).await?;
    let user = User::insert(
        &mut *tx,
        &NewUser {
            id: &user_id,
            email: &email,
            password_hash: &password_hash,
            name: body.name.trim(),
            role: Role::User,
            organization_id: &organization_id,
        },
    )
    .await?;
    tx.commit().await.map_err(crate::database::DatabaseError::from)?;

    info!("Registered {} in new organization {}", user.email, organization_id);
    Ok(ApiResponse::created(issue_token(&user, &state.config)?))
}
