use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub org_id: Uuid,
    /// Present only for list-scoped roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<Uuid>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub level: i64,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_org_level(&self) -> bool {
        self.list_id.is_none()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleCreateRequest {
    #[schema(example = "list_coordinator")]
    pub name: String,
    #[schema(example = "#1abc9c")]
    pub color: Option<String>,
    #[schema(example = 3)]
    pub level: i64,
    /// Bind the role to this list; omit for an organization-wide role.
    pub list_id: Option<Uuid>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub level: Option<i64>,
    /// Replaces the whole permission set when present.
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Roles visible to the caller, split by scope.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleCatalog {
    pub org_roles: Vec<Role>,
    pub list_roles: Vec<Role>,
    pub can_view_all_org: bool,
    /// Set when the caller only sees the roles of a single list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_to_list: Option<Uuid>,
    pub permissions: Vec<Permission>,
}

// =============================================================================
// PERMISSION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// USER-ROLE ASSIGNMENT
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}
