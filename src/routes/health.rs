use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::query_scalar;
use utoipa::ToSchema;

use crate::app::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    /// Size of the seeded permission catalogue; 0 means migrations did not run.
    pub permissions: i64,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    match query_scalar::<_, i64>("SELECT COUNT(*) FROM permissions")
        .fetch_one(&state.pool)
        .await
    {
        Ok(permissions) => Json(HealthResponse {
            status: "ok",
            db_ok: true,
            db_error: None,
            permissions,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "health check query failed");
            Json(HealthResponse {
                status: "degraded",
                db_ok: false,
                db_error: Some(e.to_string()),
                permissions: 0,
            })
        }
    }
}
