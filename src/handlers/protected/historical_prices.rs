// handlers/protected/historical_prices.rs - Supplier quote history (append-only)
//
// GET    /api/historical-prices       list (?supplierId=, ?condition=, ?productName= substring)
// POST   /api/historical-prices       record one quote
// POST   /api/historical-prices/bulk  record many quotes in one transaction
// DELETE /api/historical-prices/:id

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use super::resource;
use crate::database::models::historical_price::HISTORICAL_PRICES;
use crate::database::record::{shape_input, Operation};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::resource::refetch;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/historical-prices", get(list).post(create))
        .route("/api/historical-prices/bulk", post(create_bulk))
        .route("/api/historical-prices/:id", delete(remove))
}

/// `productName` is accepted as an alias for the general search term.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    if let Some(name) = params.remove("productName") {
        params.entry("search".to_string()).or_insert(name);
    }
    resource::list(state, user, params, &HISTORICAL_PRICES).await
}

pub async fn create(State(state): State<AppState>, user: AuthUser, ApiJson(body): ApiJson<Value>) -> ApiResult<Value> {
    resource::create(state, user, body, &HISTORICAL_PRICES).await
}

/**
 * POST /api/historical-prices/bulk
 *
 * Input:  [ { supplierId, productName, price, ... }, ... ]
 * Output: 201 [ created rows ]
 *
 * All rows commit together. The first invalid item aborts the batch with a
 * message naming its index.
 */
pub async fn create_bulk(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Vec<Value>> {
    let items = match body {
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) => return Err(ApiError::bad_request("Expected at least one price")),
        _ => return Err(ApiError::invalid_json("Request body must be a JSON array")),
    };

    let repo = Repository::new(&HISTORICAL_PRICES);
    let scope = user.scope(HISTORICAL_PRICES.scope);

    let mut tx = state.db.begin().await?;
    let mut created = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let row = shape_input(&HISTORICAL_PRICES, item, Operation::Create)
            .map_err(|e| ApiError::bad_request(format!("Item {}: {}", index, e)))?;
        repo.check_references(&mut *tx, &scope, &row)
            .await
            .map_err(|e| item_error(index, e.into()))?;
        let id = repo
            .insert(&mut *tx, &scope, row)
            .await
            .map_err(|e| item_error(index, e.into()))?;
        created.push(refetch(&repo, &mut *tx, &scope, &id).await?);
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    info!("{} recorded {} historical prices", user.email, created.len());
    Ok(ApiResponse::created(created))
}

/// Client-side store errors name the failing item; server errors pass through.
fn item_error(index: usize, err: ApiError) -> ApiError {
    match err.status_code() {
        400..=499 => ApiError::bad_request(format!("Item {}: {}", index, item_reason(&err))),
        _ => err,
    }
}

fn item_reason(err: &ApiError) -> String {
    match err {
        ApiError::ValidationError {
            field_errors: Some(fields),
            ..
        } => {
            let mut reasons: Vec<_> = fields.iter().map(|(f, r)| format!("{}: {}", f, r)).collect();
            reasons.sort();
            reasons.join(", ")
        }
        other => other.message().to_string(),
    }
}

pub async fn remove(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<()> {
    resource::remove(state, user, id, &HISTORICAL_PRICES).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_rejections_name_the_item() {
        let err = item_error(2, DatabaseError::InvalidReference("supplierId").into());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Item 2: supplierId: Referenced record does not exist");

        let err = item_error(0, DatabaseError::UniqueViolation("dup".into()).into());
        assert_eq!(err.status_code(), 400);
        assert!(err.message().starts_with("Item 0: "));
    }

    #[test]
    fn server_failures_are_not_relabelled() {
        let err = item_error(1, ApiError::internal_server_error("Database error occurred"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Database error occurred");
    }
}
