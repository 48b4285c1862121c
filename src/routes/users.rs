use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::ListFilter;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::user::{
    User, UserBatchDeleteRequest, UserCreateRequest, UserDetail, UserUpdateRequest, UserUpdateResponse,
};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(ListFilter),
    responses((status = 200, description = "Users of the organization or of one list", body = [User]))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.services.users.list_visible(auth.user_id, filter.list_id).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = UserDetail),
        (status = 403, description = "Missing permission or a role above the caller's authority"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<UserDetail>)> {
    let user = state.services.users.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/users/batch",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = [UserCreateRequest],
    responses((status = 201, description = "Users created", body = [UserDetail]))
)]
pub async fn create_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<Vec<UserCreateRequest>>,
) -> AppResult<(StatusCode, Json<Vec<UserDetail>>)> {
    let users = state.services.users.create_batch(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(users)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = UserDetail),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserDetail>> {
    Ok(Json(state.services.users.get(auth.user_id, Some(id)).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses((status = 200, description = "User updated", body = UserUpdateResponse))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UserUpdateRequest>,
) -> AppResult<Json<UserUpdateResponse>> {
    payload.id = Some(id);
    Ok(Json(state.services.users.update(auth.user_id, payload).await?))
}

#[utoipa::path(
    put,
    path = "/users/batch",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = [UserUpdateRequest],
    responses((status = 200, description = "Users updated", body = [UserUpdateResponse]))
)]
pub async fn update_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<Vec<UserUpdateRequest>>,
) -> AppResult<Json<Vec<UserUpdateResponse>>> {
    Ok(Json(state.services.users.update_batch(auth.user_id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "User soft deleted"))
)]
pub async fn delete_user(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.services.users.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/batch",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = UserBatchDeleteRequest,
    responses((status = 204, description = "Users soft deleted"))
)]
pub async fn delete_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserBatchDeleteRequest>,
) -> AppResult<StatusCode> {
    state.services.users.delete_batch(auth.user_id, &payload.user_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
