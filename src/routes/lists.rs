use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::list::{List, ListCreateRequest, ListUpdateRequest};

#[utoipa::path(
    get,
    path = "/lists",
    tag = "Lists",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Lists visible to the caller", body = [List]))
)]
pub async fn list_lists(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<List>>> {
    Ok(Json(state.services.lists.visible(auth.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/lists",
    tag = "Lists",
    security(("bearerAuth" = [])),
    request_body = ListCreateRequest,
    responses(
        (status = 201, description = "List created", body = List),
        (status = 403, description = "Missing permission or list limit reached"),
        (status = 409, description = "Name already used")
    )
)]
pub async fn create_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ListCreateRequest>,
) -> AppResult<(StatusCode, Json<List>)> {
    let list = state.services.lists.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[utoipa::path(
    get,
    path = "/lists/{id}",
    tag = "Lists",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "List id")),
    responses((status = 200, description = "List detail", body = List))
)]
pub async fn get_list(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<Json<List>> {
    Ok(Json(state.services.lists.get(auth.user_id, id).await?))
}

#[utoipa::path(
    put,
    path = "/lists/{id}",
    tag = "Lists",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "List id")),
    request_body = ListUpdateRequest,
    responses((status = 200, description = "List updated", body = List))
)]
pub async fn update_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListUpdateRequest>,
) -> AppResult<Json<List>> {
    Ok(Json(state.services.lists.update(auth.user_id, id, payload).await?))
}
