use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{optional_text, require_text};
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::{ballot_entry_from_row, campaign_from_row, format_date, opt_uuid_col, uuid_col};
use crate::errors::{AppError, AppResult};
use crate::models::campaign::{
    BallotEntry, Campaign, CampaignCandidateRequest, CampaignCreateRequest, CampaignUpdateRequest,
};
use crate::utils::utc_now;

const CAMPAIGN_COLUMNS: &str = "id, list_id, name, description, start_date, end_date, created_at, updated_at";

#[derive(Clone)]
pub struct CampaignService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl CampaignService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    pub async fn create(&self, actor: Uuid, req: CampaignCreateRequest) -> AppResult<Campaign> {
        let name = require_text(&req.name, "name")?;
        let description = optional_text(req.description.as_deref(), "description")?;
        ensure_date_order(req.start_date, req.end_date)?;

        self.engine
            .authorize(actor, Guard::new(Target::List(req.list_id), policy::CREATE_CAMPAIGN))
            .await?;

        let id = Uuid::new_v4();
        let now = utc_now().to_rfc3339();
        sqlx::query(
            "INSERT INTO campaigns (id, list_id, name, description, start_date, end_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(req.list_id.to_string())
        .bind(&name)
        .bind(&description)
        .bind(format_date(req.start_date))
        .bind(format_date(req.end_date))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, "a campaign with this name already exists in the list"))?;

        tracing::info!(campaign_id = %id, list_id = %req.list_id, actor_id = %actor, "campaign created");
        self.fetch(id).await
    }

    /// Campaigns of one list, or of the whole organization.
    pub async fn list(&self, actor: Uuid, list_id: Option<Uuid>) -> AppResult<Vec<Campaign>> {
        let target = list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::VIEW_CAMPAIGNS))
            .await?;

        let rows = match list_id {
            Some(list) => {
                let sql = format!(
                    "SELECT {} FROM campaigns WHERE list_id = ? ORDER BY start_date",
                    CAMPAIGN_COLUMNS
                );
                sqlx::query(&sql).bind(list.to_string()).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM campaigns WHERE list_id IN (SELECT id FROM lists WHERE org_id = ?) \
                     ORDER BY start_date",
                    CAMPAIGN_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(auth.org_id().to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(campaign_from_row).collect()
    }

    /// Candidates standing in the campaign may always read it.
    pub async fn get(&self, actor: Uuid, campaign_id: Uuid) -> AppResult<Campaign> {
        self.engine
            .authorize(actor, Guard::new(Target::Campaign(campaign_id), policy::VIEW_CAMPAIGN))
            .await?;
        self.fetch(campaign_id).await
    }

    pub async fn update(&self, actor: Uuid, campaign_id: Uuid, req: CampaignUpdateRequest) -> AppResult<Campaign> {
        let name = optional_text(req.name.as_deref(), "name")?;
        let description = optional_text(req.description.as_deref(), "description")?;
        if let (Some(start), Some(end)) = (req.start_date, req.end_date) {
            ensure_date_order(start, end)?;
        }

        self.engine
            .authorize(actor, Guard::new(Target::Campaign(campaign_id), policy::UPDATE_CAMPAIGN))
            .await?;

        let current = self.fetch(campaign_id).await?;
        let start = req.start_date.unwrap_or(current.start_date);
        let end = req.end_date.unwrap_or(current.end_date);
        ensure_date_order(start, end)?;

        sqlx::query(
            "UPDATE campaigns SET name = COALESCE(?, name), description = COALESCE(?, description), \
             start_date = ?, end_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&description)
        .bind(format_date(start))
        .bind(format_date(end))
        .bind(utc_now().to_rfc3339())
        .bind(campaign_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, "a campaign with this name already exists in the list"))?;

        tracing::info!(campaign_id = %campaign_id, actor_id = %actor, "campaign updated");
        self.fetch(campaign_id).await
    }

    pub async fn delete(&self, actor: Uuid, campaign_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(actor, Guard::new(Target::Campaign(campaign_id), policy::DELETE_CAMPAIGN))
            .await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM campaign_candidates WHERE campaign_id = ?")
            .bind(campaign_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(campaign_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(campaign_id = %campaign_id, actor_id = %actor, "campaign deleted");
        Ok(())
    }

    /// Attaches a candidate of the campaign's own list, optionally running
    /// for an org-wide position or one of that list's positions.
    pub async fn add_candidate(&self, actor: Uuid, campaign_id: Uuid, req: CampaignCandidateRequest) -> AppResult<()> {
        if req.position_in_list.is_some_and(|p| p <= 0) {
            return Err(AppError::bad_request("position_in_list must be a positive integer"));
        }

        let auth = self
            .engine
            .authorize(
                actor,
                Guard::new(Target::Campaign(campaign_id), policy::MANAGE_CAMPAIGN_CANDIDATES),
            )
            .await?;

        let candidate_list = sqlx::query(
            "SELECT c.list_id FROM candidates c JOIN lists l ON l.id = c.list_id WHERE c.id = ? AND l.org_id = ?",
        )
        .bind(req.candidate_id.to_string())
        .bind(auth.org_id().to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("candidate not found"))?;
        if Some(uuid_col(&candidate_list, "list_id")?) != auth.target.list_id {
            return Err(AppError::bad_request("the candidate belongs to another list"));
        }

        if let Some(position_id) = req.position_id {
            let position_list = sqlx::query("SELECT list_id FROM positions WHERE id = ? AND org_id = ?")
                .bind(position_id.to_string())
                .bind(auth.org_id().to_string())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::not_found("position not found"))?;
            if let Some(list) = opt_uuid_col(&position_list, "list_id")? {
                if Some(list) != auth.target.list_id {
                    return Err(AppError::bad_request("the position belongs to another list"));
                }
            }
        }

        sqlx::query(
            "INSERT INTO campaign_candidates (campaign_id, candidate_id, position_in_list, position_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(campaign_id.to_string())
        .bind(req.candidate_id.to_string())
        .bind(req.position_in_list)
        .bind(req.position_id.map(|p| p.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, "the candidate is already part of this campaign"))?;

        tracing::info!(
            campaign_id = %campaign_id,
            candidate_id = %req.candidate_id,
            actor_id = %actor,
            "candidate added to campaign"
        );
        Ok(())
    }

    pub async fn remove_candidate(&self, actor: Uuid, campaign_id: Uuid, candidate_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(
                actor,
                Guard::new(Target::Campaign(campaign_id), policy::MANAGE_CAMPAIGN_CANDIDATES),
            )
            .await?;

        let result = sqlx::query("DELETE FROM campaign_candidates WHERE campaign_id = ? AND candidate_id = ?")
            .bind(campaign_id.to_string())
            .bind(candidate_id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("candidate is not part of this campaign"));
        }

        tracing::info!(
            campaign_id = %campaign_id,
            candidate_id = %candidate_id,
            actor_id = %actor,
            "candidate removed from campaign"
        );
        Ok(())
    }

    /// The campaign's ballot: candidates in list order, unordered ones last.
    pub async fn candidates(&self, actor: Uuid, campaign_id: Uuid) -> AppResult<Vec<BallotEntry>> {
        self.engine
            .authorize(actor, Guard::new(Target::Campaign(campaign_id), policy::VIEW_CAMPAIGN))
            .await?;

        let rows = sqlx::query(
            "SELECT c.id, c.list_id, c.user_id, c.school_class, c.bio, c.photo_file_id, c.created_at, \
             cc.position_in_list, p.id AS position_id, p.org_id AS position_org_id, \
             p.list_id AS position_list_id, p.name AS position_name, p.created_at AS position_created_at \
             FROM campaign_candidates cc JOIN candidates c ON c.id = cc.candidate_id \
             LEFT JOIN positions p ON p.id = cc.position_id \
             WHERE cc.campaign_id = ? \
             ORDER BY cc.position_in_list IS NULL, cc.position_in_list, c.created_at",
        )
        .bind(campaign_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ballot_entry_from_row).collect()
    }

    async fn fetch(&self, campaign_id: Uuid) -> AppResult<Campaign> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = ?", CAMPAIGN_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(campaign_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("campaign not found"))?;
        campaign_from_row(&row)
    }
}

fn ensure_date_order(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start >= end {
        return Err(AppError::bad_request("start_date must be before end_date"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_must_be_strictly_ordered() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(ensure_date_order(d(1), d(2)).is_ok());
        assert!(ensure_date_order(d(2), d(2)).is_err());
        assert!(ensure_date_order(d(3), d(2)).is_err());
    }
}
