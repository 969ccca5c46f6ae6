pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use response::{ApiJson, ApiResponse, ApiResult};
