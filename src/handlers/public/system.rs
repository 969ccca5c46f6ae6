// handlers/public/system.rs - GET / and GET /health

use axum::extract::State;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Blu API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Back-office API for clients, suppliers, orders, BluFacilita financing and pricing",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public); /api/auth/me (protected)",
            "resources": "/api/clients, /api/suppliers, /api/orders, /api/historical-prices, /api/custom-table, /api/pricing/*, /api/integrations (protected)",
            "dashboard": "/api/dashboard/stats, /api/dashboard/weekly-summary (protected)",
            "integrations": "/api/tracking/*, /api/contracts/signature, /api/ai/parse-price-list (protected)",
            "admin": "/api/admin/* (admin role)",
            "uploads": "/uploads/*"
        }
    }))
}

/// 200 when the store answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.db.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "database": "ok",
        "timestamp": Utc::now(),
    })))
}
