// handlers/protected/resource.rs - Generic CRUD for any described resource
//
// GET    {path}      list (search + declared filters from the query string)
// POST   {path}      create -> 201
// GET    {path}/:id  show
// PUT    {path}/:id  partial update
// DELETE {path}/:id  idempotent delete -> 204

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::database::models::ResourceSpec;
use crate::database::ListQuery;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub fn crud_routes(path: &str, spec: &'static ResourceSpec) -> Router<AppState> {
    Router::new()
        .route(
            path,
            get(
                move |State(state): State<AppState>, user: AuthUser, Query(params): Query<HashMap<String, String>>| {
                    list(state, user, params, spec)
                },
            )
            .post(move |State(state): State<AppState>, user: AuthUser, ApiJson(body): ApiJson<Value>| {
                create(state, user, body, spec)
            }),
        )
        .route(
            &format!("{}/:id", path),
            get(move |State(state): State<AppState>, user: AuthUser, Path(id): Path<String>| {
                show(state, user, id, spec)
            })
            .put(
                move |State(state): State<AppState>,
                      user: AuthUser,
                      Path(id): Path<String>,
                      ApiJson(body): ApiJson<Value>| { update(state, user, id, body, spec) },
            )
            .delete(move |State(state): State<AppState>, user: AuthUser, Path(id): Path<String>| {
                remove(state, user, id, spec)
            }),
        )
}

pub async fn list(
    state: AppState,
    user: AuthUser,
    params: HashMap<String, String>,
    spec: &'static ResourceSpec,
) -> ApiResult<Vec<Value>> {
    let query = ListQuery::from_params(spec, &params)?;
    let rows = state.resource(spec).list(&user.scope(spec.scope), &query).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn show(state: AppState, user: AuthUser, id: String, spec: &'static ResourceSpec) -> ApiResult<Value> {
    let row = state.resource(spec).get(&user.scope(spec.scope), &id).await?;
    Ok(ApiResponse::success(row))
}

pub async fn create(state: AppState, user: AuthUser, body: Value, spec: &'static ResourceSpec) -> ApiResult<Value> {
    let row = state.resource(spec).create(&user.scope(spec.scope), &body).await?;
    tracing::info!("{} created {} {}", user.email, spec.table, row["id"]);
    Ok(ApiResponse::created(row))
}

pub async fn update(
    state: AppState,
    user: AuthUser,
    id: String,
    body: Value,
    spec: &'static ResourceSpec,
) -> ApiResult<Value> {
    let row = state.resource(spec).update(&user.scope(spec.scope), &id, &body).await?;
    Ok(ApiResponse::success(row))
}

pub async fn remove(state: AppState, user: AuthUser, id: String, spec: &'static ResourceSpec) -> ApiResult<()> {
    state.resource(spec).delete(&user.scope(spec.scope), &id).await?;
    Ok(ApiResponse::no_content())
}
