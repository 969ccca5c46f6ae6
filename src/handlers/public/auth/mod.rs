// handlers/public/auth/mod.rs - Token acquisition
//
// Registration creates an organization and its first account; login checks the
// password hash. Both answer with a signed token valid for the configured expiry.
// There is no refresh endpoint: logging in again is the only renewal path.

use serde::Serialize;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::database::models::user::{PublicUser, User};
use crate::error::ApiError;

pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: PublicUser,
}

pub(crate) fn issue_token(user: &User, config: &AppConfig) -> Result<TokenResponse, ApiError> {
    let claims = Claims::new(
        &user.id,
        &user.email,
        user.role(),
        &user.organization_id,
        config.security.jwt_expiry_hours,
    );
    Ok(TokenResponse {
        token: generate_jwt(&claims, &config.security)?,
        user: user.public(),
    })
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
