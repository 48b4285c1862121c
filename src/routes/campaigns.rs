use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::ListFilter;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::campaign::{
    BallotEntry, Campaign, CampaignCandidateRequest, CampaignCreateRequest, CampaignUpdateRequest,
};

#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(ListFilter),
    responses((status = 200, description = "Campaigns of the organization or of one list", body = [Campaign]))
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> AppResult<Json<Vec<Campaign>>> {
    Ok(Json(state.services.campaigns.list(auth.user_id, filter.list_id).await?))
}

#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    request_body = CampaignCreateRequest,
    responses(
        (status = 201, description = "Campaign created", body = Campaign),
        (status = 400, description = "start_date is not before end_date")
    )
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CampaignCreateRequest>,
) -> AppResult<(StatusCode, Json<Campaign>)> {
    let campaign = state.services.campaigns.create(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses((status = 200, description = "Campaign detail", body = Campaign))
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Campaign>> {
    Ok(Json(state.services.campaigns.get(auth.user_id, id).await?))
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CampaignUpdateRequest,
    responses((status = 200, description = "Campaign updated", body = Campaign))
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignUpdateRequest>,
) -> AppResult<Json<Campaign>> {
    Ok(Json(state.services.campaigns.update(auth.user_id, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses((status = 204, description = "Campaign deleted"))
)]
pub async fn delete_campaign(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.services.campaigns.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/candidates",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses((status = 200, description = "Candidates in ballot order with their positions", body = [BallotEntry]))
)]
pub async fn list_campaign_candidates(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<BallotEntry>>> {
    Ok(Json(state.services.campaigns.candidates(auth.user_id, id).await?))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/candidates",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CampaignCandidateRequest,
    responses(
        (status = 204, description = "Candidate added"),
        (status = 400, description = "Candidate or position of another list"),
        (status = 409, description = "Candidate already in the campaign")
    )
)]
pub async fn add_campaign_candidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignCandidateRequest>,
) -> AppResult<StatusCode> {
    state.services.campaigns.add_candidate(auth.user_id, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}/candidates/{candidate_id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Campaign id"),
        ("candidate_id" = Uuid, Path, description = "Candidate id")
    ),
    responses((status = 204, description = "Candidate removed"))
)]
pub async fn remove_campaign_candidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .services
        .campaigns
        .remove_candidate(auth.user_id, id, candidate_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
