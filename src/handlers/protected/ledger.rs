// handlers/protected/ledger.rs - Custom bookkeeping table with change history
//
// GET|POST       /api/custom-table
// GET|PUT|DELETE /api/custom-table/:id
// GET            /api/custom-table/:id/history   newest first
//
// Every update and delete first appends a snapshot of the prior row to
// custom_table_history, in the same transaction as the change. History rows
// are not tied to the live row and outlive it.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use sqlx::PgConnection;
use std::collections::HashMap;

use super::resource;
use crate::database::models::ledger::{CUSTOM_TABLE_HISTORY, CUSTOM_TABLE_ROWS};
use crate::database::record::{shape_input, shape_output, Operation};
use crate::database::{DatabaseError, ListQuery, Repository, ScopeKey};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::resource::refetch;
use crate::state::AppState;

static ROWS: Repository = Repository::new(&CUSTOM_TABLE_ROWS);
static HISTORY: Repository = Repository::new(&CUSTOM_TABLE_HISTORY);

#[derive(Debug, Clone, Copy)]
enum Change {
    Update,
    Delete,
}

impl Change {
    fn as_str(&self) -> &'static str {
        match self {
            Change::Update => "update",
            Change::Delete => "delete",
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/custom-table", get(list).post(create))
        .route("/api/custom-table/:id", get(show).put(update).delete(remove))
        .route("/api/custom-table/:id/history", get(history))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    resource::list(state, user, params, &CUSTOM_TABLE_ROWS).await
}

pub async fn show(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<Value> {
    resource::show(state, user, id, &CUSTOM_TABLE_ROWS).await
}

pub async fn create(State(state): State<AppState>, user: AuthUser, ApiJson(body): ApiJson<Value>) -> ApiResult<Value> {
    resource::create(state, user, body, &CUSTOM_TABLE_ROWS).await
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Value> {
    let changes = shape_input(&CUSTOM_TABLE_ROWS, &body, Operation::Update)?;
    let scope = user.scope(CUSTOM_TABLE_ROWS.scope);

    let mut tx = state.db.begin().await?;
    record_snapshot(&mut tx, &scope, &user, &id, Change::Update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", CUSTOM_TABLE_ROWS.name)))?;
    ROWS.update(&mut *tx, &scope, &id, changes).await?;
    let row = refetch(&ROWS, &mut *tx, &scope, &id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::success(row))
}

/// Deleting a missing row succeeds without writing history.
pub async fn remove(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<()> {
    let scope = user.scope(CUSTOM_TABLE_ROWS.scope);

    let mut tx = state.db.begin().await?;
    if record_snapshot(&mut tx, &scope, &user, &id, Change::Delete).await?.is_some() {
        ROWS.delete(&mut *tx, &scope, &id).await?;
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::no_content())
}

pub async fn history(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<Vec<Value>> {
    let field = CUSTOM_TABLE_HISTORY
        .field("rowId")
        .ok_or_else(|| ApiError::internal_server_error("History is not linked to rows"))?;
    let query = ListQuery::default().with_filter(field, Value::String(id));
    let entries = state
        .resource(&CUSTOM_TABLE_HISTORY)
        .list(&user.scope(CUSTOM_TABLE_HISTORY.scope), &query)
        .await?;
    Ok(ApiResponse::success(entries))
}

/// Locks the current row, appends a snapshot of it and returns it; `None`
/// when the scoped row does not exist. Concurrent writers queue on the lock,
/// so each snapshot sees the state the previous change left.
async fn record_snapshot(
    conn: &mut PgConnection,
    scope: &ScopeKey,
    user: &AuthUser,
    id: &str,
    change: Change,
) -> Result<Option<Value>, ApiError> {
    let Some(prior) = ROWS.select_one_for_update(&mut *conn, scope, id).await? else {
        return Ok(None);
    };
    let snapshot = shape_output(&CUSTOM_TABLE_ROWS, &prior);

    let entry = shape_input(
        &CUSTOM_TABLE_HISTORY,
        &json!({
            "rowId": id,
            "action": change.as_str(),
            "snapshot": snapshot,
            "changedBy": user.id,
        }),
        Operation::Create,
    )?;
    HISTORY
        .insert(&mut *conn, &user.scope(CUSTOM_TABLE_HISTORY.scope), entry)
        .await?;

    Ok(Some(snapshot))
}
