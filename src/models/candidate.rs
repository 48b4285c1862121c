use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Candidate {
    pub id: Uuid,
    pub list_id: Uuid,
    pub user_id: Uuid,
    pub school_class: String,
    pub bio: Option<String>,
    pub photo_file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CandidateCreateRequest {
    pub user_id: Uuid,
    pub list_id: Uuid,
    #[schema(example = "5B")]
    pub school_class: String,
    pub bio: Option<String>,
    pub photo_file_id: Option<Uuid>,
}
