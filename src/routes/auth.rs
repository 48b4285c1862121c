use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, ChangePasswordRequest, LoginRequest, UserDetail};

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = state
        .services
        .users
        .authenticate(&payload.org_code, &payload.email, &payload.password)
        .await?;
    let token = state.jwt.encode(user.id, user.org_id)?;

    tracing::info!(user_id = %user.id, org_id = %user.org_id, "login");
    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserDetail),
        (status = 404, description = "User no longer exists")
    )
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<UserDetail>> {
    let user = state.services.users.get(auth.user_id, None).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "Auth",
    security(("bearerAuth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new password")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state.services.users.change_password(auth.user_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
