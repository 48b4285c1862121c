use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A named slot on the ballot ("President", "Treasurer"). Org-wide when
/// `list_id` is empty.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub id: Uuid,
    pub org_id: Uuid,
    pub list_id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PositionCreateRequest {
    #[schema(example = "President")]
    pub name: String,
    /// Bind the position to one list; omit for an org-wide position.
    pub list_id: Option<Uuid>,
}
