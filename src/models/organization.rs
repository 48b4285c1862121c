use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    Active,
    Inactive,
}

impl OrganizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "active",
            OrganizationStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "active" => Ok(OrganizationStatus::Active),
            "inactive" => Ok(OrganizationStatus::Inactive),
            other => Err(AppError::internal(format!("unknown organization status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub id: Uuid,
    /// Short public code users type at login.
    #[schema(example = "LIC0001")]
    pub code: String,
    pub name: String,
    pub status: OrganizationStatus,
    /// Upper bound on lists; `None` means unlimited.
    pub max_lists: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to stand up a new tenant with its first administrator.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrganizationBootstrap {
    #[schema(example = "LIC0001")]
    pub code: String,
    #[schema(example = "Liceo Galilei")]
    pub name: String,
    pub max_lists: Option<i64>,
    pub admin_name: String,
    pub admin_surname: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BootstrappedOrganization {
    pub organization: Organization,
    pub admin_role_id: Uuid,
    pub admin_user_id: Uuid,
}
