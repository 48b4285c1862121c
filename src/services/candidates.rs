use sqlx::SqlitePool;
use uuid::Uuid;

use super::{optional_text, require_text};
use crate::authz::permissions::CAN_BE_CANDIDATE;
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::candidate_from_row;
use crate::errors::{AppError, AppResult};
use crate::models::candidate::{Candidate, CandidateCreateRequest};
use crate::utils::utc_now;

const CANDIDATE_COLUMNS: &str = "id, list_id, user_id, school_class, bio, photo_file_id, created_at";

#[derive(Clone)]
pub struct CandidateService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl CandidateService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    /// Registers a user of the organization as a candidate of one list. The
    /// user must hold the candidacy permission.
    pub async fn create(&self, actor: Uuid, req: CandidateCreateRequest) -> AppResult<Candidate> {
        let school_class = require_text(&req.school_class, "school_class")?;
        let bio = optional_text(req.bio.as_deref(), "bio")?;

        let auth = self
            .engine
            .authorize(actor, Guard::new(Target::List(req.list_id), policy::CREATE_CANDIDATE))
            .await?;
        let org_id = auth.org_id();

        let user_in_org: Option<String> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = ? AND org_id = ? AND deleted_at IS NULL")
                .bind(req.user_id.to_string())
                .bind(org_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        if user_in_org.is_none() {
            return Err(AppError::not_found("user not found"));
        }

        if let Some(photo) = req.photo_file_id {
            let file_in_org: Option<String> = sqlx::query_scalar("SELECT id FROM files WHERE id = ? AND org_id = ?")
                .bind(photo.to_string())
                .bind(org_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
            if file_in_org.is_none() {
                return Err(AppError::not_found("file not found"));
            }
        }

        if !self
            .engine
            .oracle()
            .has_permission(req.user_id, CAN_BE_CANDIDATE)
            .await?
        {
            return Err(AppError::forbidden("this user is not allowed to stand as a candidate"));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO candidates (id, list_id, user_id, school_class, bio, photo_file_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(req.list_id.to_string())
        .bind(req.user_id.to_string())
        .bind(&school_class)
        .bind(&bio)
        .bind(req.photo_file_id.map(|f| f.to_string()))
        .bind(utc_now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, "this user is already a candidate of the list"))?;

        tracing::info!(
            candidate_id = %id,
            user_id = %req.user_id,
            list_id = %req.list_id,
            actor_id = %actor,
            "candidate created"
        );
        self.fetch(id).await
    }

    pub async fn list_by_list(&self, actor: Uuid, list_id: Uuid) -> AppResult<Vec<Candidate>> {
        self.engine
            .authorize(actor, Guard::new(Target::List(list_id), policy::VIEW_CANDIDATES))
            .await?;

        let sql = format!(
            "SELECT {} FROM candidates WHERE list_id = ? ORDER BY created_at",
            CANDIDATE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(list_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(candidate_from_row).collect()
    }

    pub async fn get(&self, actor: Uuid, candidate_id: Uuid) -> AppResult<Candidate> {
        self.engine
            .authorize(actor, Guard::new(Target::Candidate(candidate_id), policy::VIEW_CANDIDATE))
            .await?;
        self.fetch(candidate_id).await
    }

    async fn fetch(&self, candidate_id: Uuid) -> AppResult<Candidate> {
        let sql = format!("SELECT {} FROM candidates WHERE id = ?", CANDIDATE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(candidate_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("candidate not found"))?;
        candidate_from_row(&row)
    }
}
