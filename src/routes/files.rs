use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::file::{FileRegisterRequest, StoredFile};

#[utoipa::path(
    post,
    path = "/files",
    tag = "Files",
    security(("bearerAuth" = [])),
    request_body = FileRegisterRequest,
    responses(
        (status = 201, description = "File registered", body = StoredFile),
        (status = 400, description = "Empty or oversized file")
    )
)]
pub async fn register_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<FileRegisterRequest>,
) -> AppResult<(StatusCode, Json<StoredFile>)> {
    let file = state.services.files.register(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Files",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "File id")),
    responses((status = 200, description = "File metadata", body = StoredFile))
)]
pub async fn get_file(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<Json<StoredFile>> {
    Ok(Json(state.services.files.get(auth.user_id, id).await?))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Files",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "File id")),
    responses((status = 204, description = "File deleted"))
)]
pub async fn delete_file(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.services.files.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
