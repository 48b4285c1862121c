use sqlx::SqlitePool;
use uuid::Uuid;

use super::require_text;
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::position_from_row;
use crate::errors::{AppError, AppResult};
use crate::models::position::{Position, PositionCreateRequest};
use crate::utils::utc_now;

const POSITION_COLUMNS: &str = "id, org_id, list_id, name, created_at";
const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct PositionService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl PositionService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    /// Org-wide positions need the org-level permission; list positions
    /// also accept it through a role bound to that list.
    pub async fn create(&self, actor: Uuid, req: PositionCreateRequest) -> AppResult<Position> {
        let name = require_text(&req.name, "name")?;
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::bad_request(format!(
                "name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let target = req.list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::MANAGE_POSITIONS))
            .await?;

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO positions (id, org_id, list_id, name, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(auth.org_id().to_string())
            .bind(req.list_id.map(|l| l.to_string()))
            .bind(&name)
            .bind(utc_now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation(e, "a position with this name already exists here"))?;

        tracing::info!(position_id = %id, list_id = ?req.list_id, actor_id = %actor, "position created");
        self.fetch(id).await
    }

    /// Every position of the organization, or those a list's campaigns can
    /// use: its own plus the org-wide ones.
    pub async fn list(&self, actor: Uuid, list_id: Option<Uuid>) -> AppResult<Vec<Position>> {
        let target = list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::VIEW_POSITIONS))
            .await?;

        let rows = match list_id {
            Some(list) => {
                let sql = format!(
                    "SELECT {} FROM positions WHERE org_id = ? AND (list_id IS NULL OR list_id = ?) \
                     ORDER BY list_id IS NOT NULL, name",
                    POSITION_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(auth.org_id().to_string())
                    .bind(list.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM positions WHERE org_id = ? ORDER BY name", POSITION_COLUMNS);
                sqlx::query(&sql)
                    .bind(auth.org_id().to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(position_from_row).collect()
    }

    /// Ballot entries naming the position keep their place without it.
    pub async fn delete(&self, actor: Uuid, position_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(actor, Guard::new(Target::Position(position_id), policy::MANAGE_POSITIONS))
            .await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE campaign_candidates SET position_id = NULL WHERE position_id = ?")
            .bind(position_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM positions WHERE id = ?")
            .bind(position_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(position_id = %position_id, actor_id = %actor, "position deleted");
        Ok(())
    }

    async fn fetch(&self, position_id: Uuid) -> AppResult<Position> {
        let sql = format!("SELECT {} FROM positions WHERE id = ?", POSITION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(position_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("position not found"))?;
        position_from_row(&row)
    }
}
