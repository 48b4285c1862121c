pub mod auth;
pub mod campaigns;
pub mod candidates;
pub mod files;
pub mod health;
pub mod lists;
pub mod organizations;
pub mod positions;
pub mod roles;
pub mod users;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Optional `?list_id=` narrowing shared by listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilter {
    /// Restrict to one list; omit for the whole organization.
    pub list_id: Option<Uuid>,
}
