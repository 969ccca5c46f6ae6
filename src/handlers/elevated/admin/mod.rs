// handlers/elevated/admin/mod.rs - Administrative operations

use axum::{
    routing::{get, put},
    Router,
};

use crate::database::models::saas::{BILLING, PLANS, SAAS_CLIENTS};
use crate::handlers::protected::resource::crud_routes;
use crate::state::AppState;

pub mod stats; // GET /api/admin/stats
pub mod users; // /api/admin/users

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(users::users_list).post(users::users_invite))
        .route("/api/admin/users/:id/role", put(users::users_set_role))
        .route("/api/admin/stats", get(stats::stats_get))
        .merge(crud_routes("/api/admin/saas-clients", &SAAS_CLIENTS))
        .merge(crud_routes("/api/admin/plans", &PLANS))
        .merge(crud_routes("/api/admin/billing", &BILLING))
}
