// handlers/protected/finance.rs - Client payments and order costs
//
// GET|POST /api/orders/:id/payments   DELETE /api/orders/:id/payments/:entry_id
// GET|POST /api/orders/:id/costs      DELETE /api/orders/:id/costs/:entry_id
//
// Entries are keyed by the recording user, not the organization. Creating one
// still requires the order to belong to the caller's organization.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Router,
};
use serde_json::Value;

use crate::database::models::{
    finance::{CLIENT_PAYMENTS, ORDER_COSTS},
    order::ORDERS,
    Field, ResourceSpec, Scope,
};
use crate::database::{ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(entry_routes("payments", &CLIENT_PAYMENTS))
        .merge(entry_routes("costs", &ORDER_COSTS))
}

fn entry_routes(segment: &str, spec: &'static ResourceSpec) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/orders/:id/{}", segment),
            get(move |State(state): State<AppState>, user: AuthUser, Path(order_id): Path<String>| {
                list_for_order(state, user, order_id, spec)
            })
            .post(
                move |State(state): State<AppState>,
                      user: AuthUser,
                      Path(order_id): Path<String>,
                      ApiJson(body): ApiJson<Value>| { create_for_order(state, user, order_id, body, spec) },
            ),
        )
        .route(
            &format!("/api/orders/:id/{}/:entry_id", segment),
            delete(
                move |State(state): State<AppState>,
                      user: AuthUser,
                      Path((_order_id, entry_id)): Path<(String, String)>| {
                    delete_entry(state, user, entry_id, spec)
                },
            ),
        )
}

fn order_field(spec: &'static ResourceSpec) -> Result<&'static Field, ApiError> {
    spec.field("orderId")
        .ok_or_else(|| ApiError::internal_server_error(format!("{} is not linked to orders", spec.name)))
}

pub async fn list_for_order(
    state: AppState,
    user: AuthUser,
    order_id: String,
    spec: &'static ResourceSpec,
) -> ApiResult<Vec<Value>> {
    let query = ListQuery::default().with_filter(order_field(spec)?, Value::String(order_id));
    let rows = state.resource(spec).list(&user.scope(spec.scope), &query).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn create_for_order(
    state: AppState,
    user: AuthUser,
    order_id: String,
    body: Value,
    spec: &'static ResourceSpec,
) -> ApiResult<Value> {
    let Value::Object(mut input) = body else {
        return Err(ApiError::invalid_json("Request body must be a JSON object"));
    };

    Repository::new(&ORDERS)
        .select_404(state.db.pool(), &user.scope(Scope::Organization), &order_id)
        .await?;

    input.insert(order_field(spec)?.api.to_string(), Value::String(order_id));
    let row = state.resource(spec).create(&user.scope(spec.scope), &Value::Object(input)).await?;
    Ok(ApiResponse::created(row))
}

pub async fn delete_entry(state: AppState, user: AuthUser, entry_id: String, spec: &'static ResourceSpec) -> ApiResult<()> {
    state.resource(spec).delete(&user.scope(spec.scope), &entry_id).await?;
    Ok(ApiResponse::no_content())
}
