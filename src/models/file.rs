use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata of an uploaded file. The bytes live in external storage under `storage_path`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    pub id: Uuid,
    pub org_id: Uuid,
    pub list_id: Option<Uuid>,
    pub user_id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub category: Option<String>,
    pub storage_path: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FileRegisterRequest {
    #[schema(example = "manifesto.pdf")]
    pub name: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub size_bytes: i64,
    pub list_id: Option<Uuid>,
    #[schema(example = "logos")]
    pub category: Option<String>,
}
