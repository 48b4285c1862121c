use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::ListFilter;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::position::{Position, PositionCreateRequest};

#[utoipa::path(
    get,
    path = "/positions",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(ListFilter),
    responses((status = 200, description = "Positions of the organization, or those usable by one list", body = [Position]))
)]
pub async fn list_positions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> AppResult<Json<Vec<Position>>> {
    Ok(Json(state.services.positions.list(auth.user_id, filter.list_id).await?))
}

#[utoipa::path(
    post,
    path = "/positions",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    request_body = PositionCreateRequest,
    responses(
        (status = 201, description = "Position created", body = Position),
        (status = 409, description = "Name already used in this scope")
    )
)]
pub async fn create_position(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PositionCreateRequest>,
) -> AppResult<(StatusCode, Json<Position>)> {
    let position = state.services.positions.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

#[utoipa::path(
    delete,
    path = "/positions/{id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Position id")),
    responses((status = 204, description = "Position deleted"))
)]
pub async fn delete_position(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.services.positions.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
