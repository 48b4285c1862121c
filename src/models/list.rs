use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A ballot list (party) inside an organization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct List {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub slogan: String,
    pub color_primary: Option<String>,
    pub color_secondary: Option<String>,
    pub logo_file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListCreateRequest {
    #[schema(example = "Student Voice")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "Every voice counts")]
    pub slogan: Option<String>,
    #[schema(example = "#1E90FF")]
    pub color_primary: Option<String>,
    #[schema(example = "#FFFFFF")]
    pub color_secondary: Option<String>,
    pub logo_file_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slogan: Option<String>,
    pub color_primary: Option<String>,
    pub color_secondary: Option<String>,
    pub logo_file_id: Option<Uuid>,
}
