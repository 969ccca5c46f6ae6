// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind jwt_auth_middleware, which attaches the
// principal ({id, email, role, organizationId}) that scopes each statement.

use axum::{middleware, Router};

use crate::database::models::{client::CLIENTS, integration::INTEGRATIONS, order::ORDERS, supplier::SUPPLIERS};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub mod ai;
pub mod auth;
pub mod contracts;
pub mod dashboard;
pub mod finance;
pub mod historical_prices;
pub mod ledger;
pub mod orders;
pub mod pricing;
pub mod resource;
pub mod tracking;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(resource::crud_routes("/api/clients", &CLIENTS))
        .merge(resource::crud_routes("/api/suppliers", &SUPPLIERS))
        .merge(resource::crud_routes("/api/orders", &ORDERS))
        .merge(orders::routes())
        .merge(finance::routes())
        .merge(historical_prices::routes())
        .merge(ledger::routes())
        .merge(pricing::routes())
        .merge(resource::crud_routes("/api/integrations", &INTEGRATIONS))
        .merge(dashboard::routes())
        .merge(tracking::routes())
        .merge(contracts::routes())
        .merge(ai::routes())
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}
