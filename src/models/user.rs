use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DbUser {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: value.id,
            org_id: value.org_id,
            name: value.name,
            surname: value.surname,
            email: value.email,
            must_change_password: value.must_change_password,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted_at: value.deleted_at,
        })
    }
}

/// A user together with the roles and lists it belongs to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub role_ids: Vec<Uuid>,
    pub list_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "Lovelace")]
    pub surname: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
    #[serde(default)]
    pub list_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    /// Target user; defaults to the caller.
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub reset_password: bool,
    #[serde(default)]
    pub add_lists: Vec<Uuid>,
    #[serde(default)]
    pub remove_lists: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserUpdateResponse {
    pub user: User,
    /// Returned once when the password was reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserBatchDeleteRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "LIC0001")]
    pub org_code: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
