// handlers/elevated/mod.rs - Elevated handlers (bearer token + admin role)
//
// Route prefix: /api/admin/*
// Middleware: jwt_auth_middleware (outer) then require_admin (inner).
//
// Users are managed inside the caller's organization. SaaS clients, plans and
// billing are platform-level rows with no tenant key; the role is the only guard.

use axum::{middleware, Router};

use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::state::AppState;

pub mod admin;

pub fn routes(state: AppState) -> Router<AppState> {
    admin::routes()
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}
