// handlers/elevated/admin/users.rs - Accounts inside the admin's organization
//
// GET  /api/admin/users            list
// POST /api/admin/users            create an account with an initial password
// PUT  /api/admin/users/:id/role   change role

use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, Role};
use crate::database::models::user::{NewUser, PublicUser, User};
use crate::error::ApiError;
use crate::handlers::public::auth::{normalize_email, MIN_PASSWORD_LENGTH};
use crate::handlers::require_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub role: String,
}

pub async fn users_list(State(state): State<AppState>, admin: AuthUser) -> ApiResult<Vec<PublicUser>> {
    let users = User::list_for_organization(state.db.pool(), &admin.organization_id).await?;
    Ok(ApiResponse::success(users.iter().map(User::public).collect()))
}

/**
 * POST /api/admin/users - Add an account to the caller's organization
 *
 * Input:  { email, password, name, role? }   role defaults to "user"
 * Output: 201 public user
 */
pub async fn users_invite(
    State(state): State<AppState>,
    admin: AuthUser,
    ApiJson(body): ApiJson<InviteRequest>,
) -> ApiResult<PublicUser> {
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
    let role = match body.role.as_deref() {
        None => Role::User,
        Some(raw) => parse_role(raw)?,
    };

    let email = normalize_email(&body.email);
    if User::find_by_email(state.db.pool(), &email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = hash_password(&body.password)?;
    let id = Uuid::new_v4().to_string();
    let user = User::insert(
        state.db.pool(),
        &NewUser {
            id: &id,
            email: &email,
            password_hash: &password_hash,
            name: body.name.trim(),
            role,
            organization_id: &admin.organization_id,
        },
    )
    .await?;

    info!("{} added {} as {}", admin.email, user.email, role.as_str());
    Ok(ApiResponse::created(user.public()))
}

/// An admin cannot change their own role.
pub async fn users_set_role(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> ApiResult<PublicUser> {
    let role = parse_role(&body.role)?;
    if id == admin.id {
        return Err(ApiError::bad_request("You cannot change your own role"));
    }

    let user = User::set_role(state.db.pool(), &id, &admin.organization_id, role)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!("{} set role of {} to {}", admin.email, user.email, role.as_str());
    Ok(ApiResponse::success(user.public()))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::parse(raw.trim()).ok_or_else(|| ApiError::bad_request(format!("Unknown role '{}'", raw.trim())))
}
