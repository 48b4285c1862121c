use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::organization::Organization;

#[utoipa::path(
    get,
    path = "/organizations/current",
    tag = "Organizations",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "The caller's organization", body = Organization))
)]
pub async fn current(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Organization>> {
    Ok(Json(state.services.organizations.current(auth.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/organizations/code/{code}",
    tag = "Organizations",
    params(("code" = String, Path, description = "Organization code")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn by_code(State(state): State<AppState>, Path(code): Path<String>) -> AppResult<Json<Organization>> {
    Ok(Json(state.services.organizations.by_code(&code).await?))
}
