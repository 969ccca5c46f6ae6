// handlers/protected/pricing.rs - Price table: categories, products, globals
//
// /api/pricing/categories[/:id]       plain CRUD
// /api/pricing/products[/:id]         CRUD; list-price changes are logged
// GET /api/pricing/products/:id/history
// GET|PUT /api/pricing/globals        per-user settings

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::debug;

use super::resource;
use crate::database::models::pricing::{CATEGORIES, GLOBALS, PRICE_HISTORY, PRODUCTS};
use crate::database::record::{shape_input, shape_output, Operation};
use crate::database::{DatabaseError, ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::resource::refetch;
use crate::state::AppState;

static PRODUCT_REPO: Repository = Repository::new(&PRODUCTS);
static HISTORY_REPO: Repository = Repository::new(&PRICE_HISTORY);
static GLOBALS_REPO: Repository = Repository::new(&GLOBALS);

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(resource::crud_routes("/api/pricing/categories", &CATEGORIES))
        .route("/api/pricing/products", get(list_products).post(create_product))
        .route(
            "/api/pricing/products/:id",
            get(show_product).put(update_product).delete(remove_product),
        )
        .route("/api/pricing/products/:id/history", get(product_history))
        .route("/api/pricing/globals", get(globals_get).put(globals_put))
}

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    resource::list(state, user, params, &PRODUCTS).await
}

pub async fn show_product(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<Value> {
    resource::show(state, user, id, &PRODUCTS).await
}

pub async fn remove_product(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> ApiResult<()> {
    resource::remove(state, user, id, &PRODUCTS).await
}

/// A product created with a list price gets an opening history entry.
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Value> {
    let row = shape_input(&PRODUCTS, &body, Operation::Create)?;
    let new_price = row.get("list_price").cloned().unwrap_or(Value::Null);
    let scope = user.scope(PRODUCTS.scope);

    let mut tx = state.db.begin().await?;
    PRODUCT_REPO.check_references(&mut *tx, &scope, &row).await?;
    let id = PRODUCT_REPO.insert(&mut *tx, &scope, row).await?;
    if !new_price.is_null() {
        log_price_change(&mut tx, &user, &id, Value::Null, new_price).await?;
    }
    let product = refetch(&PRODUCT_REPO, &mut *tx, &scope, &id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::created(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Value> {
    let changes = shape_input(&PRODUCTS, &body, Operation::Update)?;
    let new_price = changes.get("list_price").cloned();
    let scope = user.scope(PRODUCTS.scope);

    let mut tx = state.db.begin().await?;
    let prior = PRODUCT_REPO.select_404(&mut *tx, &scope, &id).await?;
    PRODUCT_REPO.check_references(&mut *tx, &scope, &changes).await?;
    PRODUCT_REPO.update(&mut *tx, &scope, &id, changes).await?;

    if let Some(new_price) = new_price {
        let old_price = prior.get("list_price").cloned().unwrap_or(Value::Null);
        if price_changed(&old_price, &new_price) {
            log_price_change(&mut tx, &user, &id, old_price, new_price).await?;
        }
    }

    let product = refetch(&PRODUCT_REPO, &mut *tx, &scope, &id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(ApiResponse::success(product))
}

pub async fn product_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let scope = user.scope(PRODUCTS.scope);
    PRODUCT_REPO.select_404(state.db.pool(), &scope, &id).await?;

    let field = PRICE_HISTORY
        .field("productId")
        .ok_or_else(|| ApiError::internal_server_error("Price history is not linked to products"))?;
    let query = ListQuery::default().with_filter(field, Value::String(id));
    let entries = state.resource(&PRICE_HISTORY).list(&user.scope(PRICE_HISTORY.scope), &query).await?;
    Ok(ApiResponse::success(entries))
}

/// The caller's settings, or the defaults when they never saved any.
pub async fn globals_get(State(state): State<AppState>, user: AuthUser) -> ApiResult<Value> {
    let scope = user.scope(GLOBALS.scope);
    let rows = GLOBALS_REPO.select_any(state.db.pool(), &scope, &ListQuery::default()).await?;

    let globals = match rows.first() {
        Some(row) => shape_output(&GLOBALS, row),
        None => default_globals(&user),
    };
    Ok(ApiResponse::success(globals))
}

pub async fn globals_put(State(state): State<AppState>, user: AuthUser, ApiJson(body): ApiJson<Value>) -> ApiResult<Value> {
    let changes = shape_input(&GLOBALS, &body, Operation::Update)?;
    let scope = user.scope(GLOBALS.scope);

    GLOBALS_REPO.upsert_for_user(state.db.pool(), &scope, changes).await?;

    let rows = GLOBALS_REPO.select_any(state.db.pool(), &scope, &ListQuery::default()).await?;
    let row = rows
        .first()
        .ok_or_else(|| ApiError::internal_server_error(format!("{} saved but could not be retrieved", GLOBALS.name)))?;
    Ok(ApiResponse::success(shape_output(&GLOBALS, row)))
}

fn default_globals(user: &AuthUser) -> Value {
    json!({
        "taxPercent": 0,
        "defaultFreight": 0,
        "roundingUnit": 1,
        "defaultMarkup": 0,
        "userId": user.id,
        "organizationId": user.organization_id,
    })
}

/// Prices come back from the store as JSON numbers whose textual form may
/// differ (`100` vs `100.00`), so compare numerically.
fn price_changed(old: &Value, new: &Value) -> bool {
    match (old.as_f64(), new.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() >= 0.005,
        (None, None) => false,
        _ => true,
    }
}

async fn log_price_change(
    conn: &mut PgConnection,
    user: &AuthUser,
    product_id: &str,
    old_price: Value,
    new_price: Value,
) -> Result<(), ApiError> {
    debug!("Product {} list price {} -> {}", product_id, old_price, new_price);
    let entry = shape_input(
        &PRICE_HISTORY,
        &json!({
            "productId": product_id,
            "oldPrice": old_price,
            "newPrice": new_price,
            "changedBy": user.id,
        }),
        Operation::Create,
    )?;
    HISTORY_REPO.insert(conn, &user.scope(PRICE_HISTORY.scope), entry).await?;
    Ok(())
}
