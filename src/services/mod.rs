//! Domain services.
//!
//! Every guarded operation takes the acting user's id explicitly, validates
//! its payload, passes the authorization gate and only then touches storage.

pub mod campaigns;
pub mod candidates;
pub mod files;
pub mod lists;
pub mod organizations;
pub mod positions;
pub mod roles;
pub mod users;

pub use campaigns::CampaignService;
pub use candidates::CandidateService;
pub use files::FileService;
pub use lists::ListService;
pub use organizations::OrganizationService;
pub use positions::PositionService;
pub use roles::RoleService;
pub use users::UserService;

use std::collections::HashSet;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::AuthorizationEngine;
use crate::errors::{AppError, AppResult};

/// All domain services over one pool and one gate.
#[derive(Clone)]
pub struct Services {
    pub roles: RoleService,
    pub users: UserService,
    pub lists: ListService,
    pub campaigns: CampaignService,
    pub positions: PositionService,
    pub candidates: CandidateService,
    pub files: FileService,
    pub organizations: OrganizationService,
}

impl Services {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine, max_upload_bytes: i64) -> Self {
        Self {
            roles: RoleService::new(pool.clone(), engine.clone()),
            users: UserService::new(pool.clone(), engine.clone()),
            lists: ListService::new(pool.clone(), engine.clone()),
            campaigns: CampaignService::new(pool.clone(), engine.clone()),
            positions: PositionService::new(pool.clone(), engine.clone()),
            candidates: CandidateService::new(pool.clone(), engine.clone()),
            files: FileService::new(pool.clone(), engine.clone(), max_upload_bytes),
            organizations: OrganizationService::new(pool, engine),
        }
    }
}

/// Trimmed value, or BadRequest when nothing is left.
pub(crate) fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>, field: &str) -> AppResult<Option<String>> {
    value.map(|v| require_text(v, field)).transpose()
}

/// `#RRGGBB`, normalized to upper case.
pub(crate) fn validate_color(value: Option<&str>, field: &str) -> AppResult<Option<String>> {
    let Some(color) = value else {
        return Ok(None);
    };
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::bad_request(format!("{} must be a #RRGGBB color", field)));
    }
    Ok(Some(color.to_ascii_uppercase()))
}

pub(crate) fn ensure_positive_level(level: i64) -> AppResult<()> {
    if level <= 0 {
        return Err(AppError::bad_request("level must be a positive integer"));
    }
    Ok(())
}

/// Drops repeated ids, keeping first-seen order.
pub(crate) fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
