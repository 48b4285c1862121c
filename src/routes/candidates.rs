use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::candidate::{Candidate, CandidateCreateRequest};

#[utoipa::path(
    post,
    path = "/candidates",
    tag = "Candidates",
    security(("bearerAuth" = [])),
    request_body = CandidateCreateRequest,
    responses(
        (status = 201, description = "Candidate created", body = Candidate),
        (status = 403, description = "Missing permission, or the user may not stand"),
        (status = 409, description = "Already a candidate of the list")
    )
)]
pub async fn create_candidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CandidateCreateRequest>,
) -> AppResult<(StatusCode, Json<Candidate>)> {
    let candidate = state.services.candidates.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}",
    tag = "Candidates",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Candidate id")),
    responses((status = 200, description = "Candidate detail", body = Candidate))
)]
pub async fn get_candidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Candidate>> {
    Ok(Json(state.services.candidates.get(auth.user_id, id).await?))
}

#[utoipa::path(
    get,
    path = "/lists/{id}/candidates",
    tag = "Candidates",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "List id")),
    responses((status = 200, description = "Candidates of the list", body = [Candidate]))
)]
pub async fn list_candidates(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Candidate>>> {
    Ok(Json(state.services.candidates.list_by_list(auth.user_id, id).await?))
}
