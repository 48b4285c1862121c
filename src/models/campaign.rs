use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::candidate::Candidate;
use super::position::Position;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Campaign {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignCreateRequest {
    #[schema(example = "Spring election")]
    pub name: String,
    pub list_id: Uuid,
    pub description: Option<String>,
    #[schema(example = "2026-03-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-15")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CampaignUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignCandidateRequest {
    pub candidate_id: Uuid,
    /// Ballot position of the candidate inside the list.
    pub position_in_list: Option<i64>,
    /// Position the candidate runs for; org-wide or of the campaign's list.
    pub position_id: Option<Uuid>,
}

/// One line of a campaign's ballot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BallotEntry {
    pub candidate: Candidate,
    pub position_in_list: Option<i64>,
    pub position: Option<Position>,
}
