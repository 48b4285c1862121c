use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::store::{ActorRecord, AuthzStore, EntityScope, RoleGrant, RoleRecord, Target};
use crate::db::row_parsers::{opt_uuid_col, permission_from_row, placeholders, role_record_from_row, uuid_col};
use crate::errors::AppResult;
use crate::models::role::Permission;

/// [`AuthzStore`] over the application database.
#[derive(Clone)]
pub struct SqliteAuthzStore {
    pool: SqlitePool,
}

impl SqliteAuthzStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn campaign_scope(&self, campaign_id: Uuid) -> AppResult<Option<EntityScope>> {
        let row = sqlx::query(
            "SELECT l.org_id, c.list_id FROM campaigns c JOIN lists l ON l.id = c.list_id WHERE c.id = ?",
        )
        .bind(campaign_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let owner_rows = sqlx::query(
            "SELECT cand.user_id FROM campaign_candidates cc \
             JOIN candidates cand ON cand.id = cc.candidate_id \
             WHERE cc.campaign_id = ?",
        )
        .bind(campaign_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        let owners = owner_rows
            .iter()
            .map(|r| uuid_col(r, "user_id"))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(EntityScope {
            org_id: uuid_col(&row, "org_id")?,
            list_id: Some(uuid_col(&row, "list_id")?),
            owners,
            level: None,
        }))
    }
}

#[async_trait]
impl AuthzStore for SqliteAuthzStore {
    async fn find_actor(&self, user_id: Uuid) -> AppResult<Option<ActorRecord>> {
        let row = sqlx::query("SELECT id, org_id FROM users WHERE id = ? AND deleted_at IS NULL")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| -> AppResult<ActorRecord> {
            Ok(ActorRecord {
                id: uuid_col(&r, "id")?,
                org_id: uuid_col(&r, "org_id")?,
            })
        })
        .transpose()
    }

    async fn user_roles(&self, user_id: Uuid) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query(
            "SELECT r.id, r.org_id, r.list_id, r.level FROM user_roles ur \
             JOIN users u ON u.id = ur.user_id \
             JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = ? AND u.deleted_at IS NULL",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(role_record_from_row).collect()
    }

    async fn user_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query(
            "SELECT r.id, r.org_id, r.list_id, r.level, \
                    p.id AS permission_id, p.name AS permission_name, p.description AS permission_description \
             FROM user_roles ur \
             JOIN users u ON u.id = ur.user_id \
             JOIN roles r ON r.id = ur.role_id \
             JOIN role_permissions rp ON rp.role_id = r.id \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE ur.user_id = ? AND u.deleted_at IS NULL",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<RoleGrant> {
                Ok(RoleGrant {
                    role: role_record_from_row(row)?,
                    permission: Permission {
                        id: uuid_col(row, "permission_id")?,
                        name: sqlx::Row::try_get(row, "permission_name")?,
                        description: sqlx::Row::try_get(row, "permission_description")?,
                    },
                })
            })
            .collect()
    }

    async fn user_lists(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT list_id FROM user_lists WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| uuid_col(r, "list_id")).collect()
    }

    async fn org_lists(&self, org_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM lists WHERE org_id = ?")
            .bind(org_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| uuid_col(r, "id")).collect()
    }

    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query("SELECT id, org_id, list_id, level FROM roles WHERE id = ?")
            .bind(role_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(role_record_from_row).transpose()
    }

    async fn find_permissions(&self, ids: &[Uuid]) -> AppResult<Vec<Permission>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, description FROM permissions WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(permission_from_row).collect()
    }

    async fn scope_of(&self, target: Target) -> AppResult<Option<EntityScope>> {
        match target {
            Target::Organization => Ok(None),
            Target::Role(id) => Ok(self.find_role(id).await?.map(|role| EntityScope {
                org_id: role.org_id,
                list_id: role.list_id,
                owners: Vec::new(),
                level: Some(role.level),
            })),
            Target::List(id) => {
                let row = sqlx::query("SELECT org_id FROM lists WHERE id = ?")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| -> AppResult<EntityScope> {
                    Ok(EntityScope {
                        org_id: uuid_col(&r, "org_id")?,
                        list_id: Some(id),
                        ..Default::default()
                    })
                })
                .transpose()
            }
            Target::Campaign(id) => self.campaign_scope(id).await,
            Target::Candidate(id) => {
                let row = sqlx::query(
                    "SELECT l.org_id, c.list_id, c.user_id FROM candidates c \
                     JOIN lists l ON l.id = c.list_id WHERE c.id = ?",
                )
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
                row.map(|r| -> AppResult<EntityScope> {
                    Ok(EntityScope {
                        org_id: uuid_col(&r, "org_id")?,
                        list_id: Some(uuid_col(&r, "list_id")?),
                        owners: vec![uuid_col(&r, "user_id")?],
                        level: None,
                    })
                })
                .transpose()
            }
            Target::File(id) => {
                let row = sqlx::query("SELECT org_id, list_id, user_id FROM files WHERE id = ?")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| -> AppResult<EntityScope> {
                    Ok(EntityScope {
                        org_id: uuid_col(&r, "org_id")?,
                        list_id: opt_uuid_col(&r, "list_id")?,
                        owners: vec![uuid_col(&r, "user_id")?],
                        level: None,
                    })
                })
                .transpose()
            }
            Target::User(id) => {
                let row = sqlx::query("SELECT org_id FROM users WHERE id = ? AND deleted_at IS NULL")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| -> AppResult<EntityScope> {
                    Ok(EntityScope {
                        org_id: uuid_col(&r, "org_id")?,
                        list_id: None,
                        owners: vec![id],
                        level: None,
                    })
                })
                .transpose()
            }
            Target::Position(id) => {
                let row = sqlx::query("SELECT org_id, list_id FROM positions WHERE id = ?")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| -> AppResult<EntityScope> {
                    Ok(EntityScope {
                        org_id: uuid_col(&r, "org_id")?,
                        list_id: opt_uuid_col(&r, "list_id")?,
                        ..Default::default()
                    })
                })
                .transpose()
            }
        }
    }
}
