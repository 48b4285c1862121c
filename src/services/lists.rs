use sqlx::SqlitePool;
use uuid::Uuid;

use super::{optional_text, require_text, validate_color};
use crate::authz::permissions::VIEW_ALL_LISTS;
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::{list_from_row, placeholders};
use crate::errors::{AppError, AppResult};
use crate::models::list::{List, ListCreateRequest, ListUpdateRequest};
use crate::utils::utc_now;

const LIST_COLUMNS: &str =
    "id, org_id, name, description, slogan, color_primary, color_secondary, logo_file_id, created_at";
const DUPLICATE_LIST: &str = "a list with this name already exists";

#[derive(Clone)]
pub struct ListService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl ListService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    pub async fn create(&self, actor: Uuid, req: ListCreateRequest) -> AppResult<List> {
        let name = require_text(&req.name, "name")?;
        let color_primary = validate_color(req.color_primary.as_deref(), "color_primary")?;
        let color_secondary = validate_color(req.color_secondary.as_deref(), "color_secondary")?;

        let auth = self
            .engine
            .authorize(actor, Guard::new(Target::Organization, policy::CREATE_LIST))
            .await?;
        let org_id = auth.org_id();

        let max_lists = sqlx::query_scalar::<_, Option<i64>>("SELECT max_lists FROM organizations WHERE id = ?")
            .bind(org_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .flatten();
        if let Some(max) = max_lists {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE org_id = ?")
                .bind(org_id.to_string())
                .fetch_one(&self.pool)
                .await?;
            if count >= max {
                return Err(AppError::forbidden(format!(
                    "the organization already has its maximum of {} lists",
                    max
                )));
            }
        }

        if let Some(logo) = req.logo_file_id {
            self.ensure_file_in_org(logo, org_id).await?;
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO lists (id, org_id, name, description, slogan, color_primary, color_secondary, logo_file_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(org_id.to_string())
        .bind(&name)
        .bind(req.description.as_deref().map(str::trim).unwrap_or_default())
        .bind(req.slogan.as_deref().map(str::trim).unwrap_or_default())
        .bind(&color_primary)
        .bind(&color_secondary)
        .bind(req.logo_file_id.map(|f| f.to_string()))
        .bind(utc_now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, DUPLICATE_LIST))?;

        tracing::info!(list_id = %id, org_id = %org_id, actor_id = %actor, "list created");
        self.fetch(id).await
    }

    pub async fn update(&self, actor: Uuid, list_id: Uuid, req: ListUpdateRequest) -> AppResult<List> {
        let name = optional_text(req.name.as_deref(), "name")?;
        let color_primary = validate_color(req.color_primary.as_deref(), "color_primary")?;
        let color_secondary = validate_color(req.color_secondary.as_deref(), "color_secondary")?;

        let auth = self
            .engine
            .authorize(actor, Guard::new(Target::List(list_id), policy::UPDATE_LIST))
            .await?;
        if let Some(logo) = req.logo_file_id {
            self.ensure_file_in_org(logo, auth.org_id()).await?;
        }

        sqlx::query(
            "UPDATE lists SET name = COALESCE(?, name), description = COALESCE(?, description), \
             slogan = COALESCE(?, slogan), color_primary = COALESCE(?, color_primary), \
             color_secondary = COALESCE(?, color_secondary), logo_file_id = COALESCE(?, logo_file_id) \
             WHERE id = ?",
        )
        .bind(&name)
        .bind(req.description.as_deref().map(str::trim))
        .bind(req.slogan.as_deref().map(str::trim))
        .bind(&color_primary)
        .bind(&color_secondary)
        .bind(req.logo_file_id.map(|f| f.to_string()))
        .bind(list_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, DUPLICATE_LIST))?;

        tracing::info!(list_id = %list_id, actor_id = %actor, "list updated");
        self.fetch(list_id).await
    }

    /// Every list of the organization for holders of the list view
    /// permission, otherwise the lists the caller belongs to.
    pub async fn visible(&self, actor: Uuid) -> AppResult<Vec<List>> {
        let me = self.engine.resolve_actor(actor).await?;
        let ids = self
            .engine
            .oracle()
            .lists_with_permission(actor, me.org_id, VIEW_ALL_LISTS)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM lists WHERE org_id = ? AND id IN ({}) ORDER BY name",
            LIST_COLUMNS,
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql).bind(me.org_id.to_string());
        for id in &ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(list_from_row).collect()
    }

    /// Any member of the organization may read a list.
    pub async fn get(&self, actor: Uuid, list_id: Uuid) -> AppResult<List> {
        let me = self.engine.resolve_actor(actor).await?;
        let list = self.fetch(list_id).await?;
        if list.org_id != me.org_id {
            return Err(AppError::not_found("list not found"));
        }
        Ok(list)
    }

    async fn fetch(&self, list_id: Uuid) -> AppResult<List> {
        let sql = format!("SELECT {} FROM lists WHERE id = ?", LIST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(list_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("list not found"))?;
        list_from_row(&row)
    }

    async fn ensure_file_in_org(&self, file_id: Uuid, org_id: Uuid) -> AppResult<()> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM files WHERE id = ? AND org_id = ?")
            .bind(file_id.to_string())
            .bind(org_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        found.map(|_| ()).ok_or_else(|| AppError::not_found("file not found"))
    }
}
