// handlers/elevated/admin/stats.rs - GET /api/admin/stats

use axum::extract::State;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Yearly plans contribute a twelfth of their price to monthly revenue.
const STATS_SQL: &str = r#"SELECT
    (SELECT COUNT(*) FROM "saas_clients") AS "totalClients",
    (SELECT COALESCE(jsonb_object_agg(s."status", s."count"), '{}'::jsonb)
        FROM (SELECT COALESCE("status", 'unknown') AS "status", COUNT(*) AS "count"
              FROM "saas_clients" GROUP BY 1) s) AS "clientsByStatus",
    (SELECT COALESCE(SUM(CASE WHEN p."billing_cycle" = 'yearly' THEN p."price" / 12 ELSE p."price" END), 0)
        FROM "saas_clients" c JOIN "saas_plans" p ON p."id" = c."plan_id"
        WHERE c."status" = 'active') AS "monthlyRevenue",
    (SELECT COALESCE(SUM("amount"), 0) FROM "saas_billing"
        WHERE "status" IN ('pending', 'overdue')) AS "openBilling""#;

pub async fn stats_get(State(state): State<AppState>, _admin: AuthUser) -> ApiResult<Value> {
    let row = state
        .db
        .fetch_one(STATS_SQL, &[])
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Statistics query returned no row"))?;
    Ok(ApiResponse::success(Value::Object(row)))
}
