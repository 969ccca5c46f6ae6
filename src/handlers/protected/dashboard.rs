// handlers/protected/dashboard.rs - Aggregates for the home screen
//
// GET /api/dashboard/stats
// GET /api/dashboard/weekly-summary?weekOffset=N   (N >= 0, 0 = current week)

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::Value;

use crate::database::models::{order::ORDERS, Scope};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::summary::{summarize_week, week_window, WeeklySummary};
use crate::state::AppState;

const STATS_SQL: &str = r#"SELECT
    (SELECT COUNT(*) FROM "clients" WHERE "organization_id" = $1) AS "totalClients",
    (SELECT COUNT(*) FROM "suppliers" WHERE "organization_id" = $1) AS "totalSuppliers",
    (SELECT COUNT(*) FROM "orders" WHERE "organization_id" = $1) AS "totalOrders",
    (SELECT COUNT(*) FROM "orders" WHERE "organization_id" = $1
        AND COALESCE("status", 'pending') NOT IN ('delivered', 'cancelled')) AS "pendingOrders",
    (SELECT COALESCE(SUM("selling_price"), 0) FROM "orders" WHERE "organization_id" = $1
        AND "status" = 'delivered') AS "totalRevenue""#;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/stats", get(stats))
        .route("/api/dashboard/weekly-summary", get(weekly_summary))
}

pub async fn stats(State(state): State<AppState>, user: AuthUser) -> ApiResult<Value> {
    let row = state
        .db
        .fetch_one(STATS_SQL, &[Value::String(user.organization_id.clone())])
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Statistics query returned no row"))?;
    Ok(ApiResponse::success(Value::Object(row)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub week_offset: Option<String>,
}

pub async fn weekly_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SummaryParams>,
) -> ApiResult<WeeklySummary> {
    let week_offset = parse_week_offset(params.week_offset.as_deref())?;
    let (start, end) = week_window(Local::now().date_naive(), week_offset);

    let orders = state
        .resource(&ORDERS)
        .list(&user.scope(Scope::Organization), &ListQuery::default())
        .await?;

    Ok(ApiResponse::success(summarize_week(&orders, week_offset, start, end)))
}

fn parse_week_offset(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ApiError::bad_request("weekOffset must be a non-negative integer")),
    }
}
