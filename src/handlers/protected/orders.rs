// handlers/protected/orders.rs - File attachments on orders
//
// POST   /api/orders/:id/documents                 upload, returns the document record only
// GET    /api/orders/:id/arrival-photos            the order's arrivalPhotos array
// POST   /api/orders/:id/arrival-photos            upload and append
// DELETE /api/orders/:id/arrival-photos/:photo_id  remove entry, then file (best effort)

use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, get, post},
    Router,
};
use serde_json::Value;
use tracing::info;

use crate::database::models::{order::ORDERS, Scope};
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::read_file_field;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::storage::StoredFile;
use crate::state::AppState;

const APPEND_PHOTO: &str = "UPDATE \"orders\" \
     SET \"arrival_photos\" = COALESCE(\"arrival_photos\", '[]'::jsonb) || $1, \"updated_at\" = now() \
     WHERE \"id\" = $2 AND \"organization_id\" = $3";

const REMOVE_PHOTO: &str = "UPDATE \"orders\" \
     SET \"arrival_photos\" = COALESCE((SELECT jsonb_agg(p) FROM jsonb_array_elements(\"arrival_photos\") AS p \
         WHERE p->>'id' IS DISTINCT FROM $1), '[]'::jsonb), \"updated_at\" = now() \
     WHERE \"id\" = $2 AND \"organization_id\" = $3";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/:id/documents", post(upload_document))
        .route("/api/orders/:id/arrival-photos", get(list_arrival_photos).post(add_arrival_photo))
        .route("/api/orders/:id/arrival-photos/:photo_id", delete(remove_arrival_photo))
}

/// The record is not written into the order; the client saves it with the order,
/// which may not exist yet.
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<StoredFile> {
    let file = read_file_field(multipart).await?;
    let stored = state
        .uploads
        .save(&order_id, &file.name, file.content_type.as_deref(), &file.bytes)
        .await?;
    info!("{} uploaded document {} for order {}", user.email, stored.url, order_id);
    Ok(ApiResponse::created(stored))
}

pub async fn list_arrival_photos(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Value> {
    let order = state.resource(&ORDERS).get(&user.scope(Scope::Organization), &order_id).await?;
    Ok(ApiResponse::success(order["arrivalPhotos"].clone()))
}

pub async fn add_arrival_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<StoredFile> {
    let scope = user.scope(Scope::Organization);
    Repository::new(&ORDERS).select_404(state.db.pool(), &scope, &order_id).await?;

    let file = read_file_field(multipart).await?;
    let stored = state
        .uploads
        .save(&order_id, &file.name, file.content_type.as_deref(), &file.bytes)
        .await?;

    let entry = serde_json::to_value(&stored)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to encode photo record: {}", e)))?;
    let params = [
        Value::Array(vec![entry]),
        Value::String(order_id.clone()),
        Value::String(user.organization_id.clone()),
    ];

    match state.db.execute(APPEND_PHOTO, &params).await {
        Ok(0) => {
            // Order deleted between the check and the write
            state.uploads.remove(&stored.url).await;
            Err(ApiError::not_found("Order not found"))
        }
        Ok(_) => Ok(ApiResponse::created(stored)),
        Err(e) => {
            state.uploads.remove(&stored.url).await;
            Err(e.into())
        }
    }
}

pub async fn remove_arrival_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path((order_id, photo_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let order = state.resource(&ORDERS).get(&user.scope(Scope::Organization), &order_id).await?;

    let url = order["arrivalPhotos"]
        .as_array()
        .and_then(|photos| photos.iter().find(|p| p["id"].as_str() == Some(photo_id.as_str())))
        .and_then(|p| p["url"].as_str())
        .map(str::to_string);

    let Some(url) = url else {
        return Ok(ApiResponse::no_content());
    };

    let params = [
        Value::String(photo_id),
        Value::String(order_id),
        Value::String(user.organization_id.clone()),
    ];
    state.db.execute(REMOVE_PHOTO, &params).await?;
    state.uploads.remove(&url).await;

    Ok(ApiResponse::no_content())
}
