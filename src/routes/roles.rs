use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::ListFilter;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::role::{AssignRoleRequest, Role, RoleCatalog, RoleCreateRequest, RoleUpdateRequest};

#[utoipa::path(
    get,
    path = "/roles",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(ListFilter),
    responses(
        (status = 200, description = "Roles of the organization or of one list", body = [Role]),
        (status = 403, description = "Missing role view permission")
    )
)]
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> AppResult<Json<Vec<Role>>> {
    let roles = state.services.roles.list_visible(auth.user_id, filter.list_id).await?;
    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/roles/catalog",
    tag = "Roles",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Roles visible to the caller, split by scope", body = RoleCatalog))
)]
pub async fn catalog(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<RoleCatalog>> {
    Ok(Json(state.services.roles.catalog(auth.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/roles/mine",
    tag = "Roles",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Roles held by the caller", body = [Role]))
)]
pub async fn my_roles(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.services.roles.mine(auth.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/roles/assignable",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(ListFilter),
    responses((status = 200, description = "Roles the caller may give to a new user", body = [Role]))
)]
pub async fn assignable_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> AppResult<Json<Vec<Role>>> {
    let roles = state.services.roles.assignable(auth.user_id, filter.list_id).await?;
    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "Roles",
    security(("bearerAuth" = [])),
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 403, description = "Missing permission or level too high"),
        (status = 409, description = "Name already used in this scope")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RoleCreateRequest>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let role = state.services.roles.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role detail", body = Role),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<Json<Role>> {
    Ok(Json(state.services.roles.get(auth.user_id, id).await?))
}

#[utoipa::path(
    put,
    path = "/roles/{id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 403, description = "Missing permission or level too high")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleUpdateRequest>,
) -> AppResult<Json<Role>> {
    Ok(Json(state.services.roles.update(auth.user_id, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    responses((status = 204, description = "Role deleted"))
)]
pub async fn delete_role(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.services.roles.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/roles",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = AssignRoleRequest,
    responses(
        (status = 204, description = "Role assigned"),
        (status = 403, description = "Role level is not below the caller's authority")
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .roles
        .assign_to_user(auth.user_id, id, payload.role_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/{id}/roles/{role_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "User id"),
        ("role_id" = Uuid, Path, description = "Role id")
    ),
    responses((status = 204, description = "Role revoked"))
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, role_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.services.roles.revoke_from_user(auth.user_id, id, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
