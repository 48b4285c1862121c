use sqlx::SqlitePool;
use uuid::Uuid;

use super::require_text;
use super::users::{insert_user, NewUser};
use crate::authz::AuthorizationEngine;
use crate::db::row_parsers::organization_from_row;
use crate::errors::{AppError, AppResult};
use crate::models::organization::{BootstrappedOrganization, Organization, OrganizationBootstrap, OrganizationStatus};
use crate::utils::{hash_password, utc_now, validate_password};

const ORGANIZATION_COLUMNS: &str = "id, code, name, status, max_lists, created_at";
const MAX_CODE_LENGTH: usize = 7;
const ADMIN_ROLE_NAME: &str = "administrator";
const ADMIN_ROLE_LEVEL: i64 = 100;

#[derive(Clone)]
pub struct OrganizationService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl OrganizationService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    /// Public lookup used by the login screen.
    pub async fn by_code(&self, code: &str) -> AppResult<Organization> {
        let code = normalize_code(code)?;
        let sql = format!("SELECT {} FROM organizations WHERE code = ?", ORGANIZATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("organization not found"))?;
        organization_from_row(&row)
    }

    /// The caller's own organization.
    pub async fn current(&self, actor: Uuid) -> AppResult<Organization> {
        let me = self.engine.resolve_actor(actor).await?;
        let sql = format!("SELECT {} FROM organizations WHERE id = ?", ORGANIZATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(me.org_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("organization not found"))?;
        organization_from_row(&row)
    }

    /// Creates a tenant, its top-level administrator role holding every
    /// permission, and the first user holding that role. Operator-only: not
    /// gated, reached from the CLI.
    pub async fn bootstrap(&self, req: OrganizationBootstrap) -> AppResult<BootstrappedOrganization> {
        let code = normalize_code(&req.code)?;
        let name = require_text(&req.name, "name")?;
        validate_password(&req.admin_password)?;
        if req.max_lists.is_some_and(|max| max <= 0) {
            return Err(AppError::bad_request("max_lists must be a positive integer"));
        }

        let org_id = Uuid::new_v4();
        let admin_role_id = Uuid::new_v4();
        let now = utc_now().to_rfc3339();
        let admin = NewUser {
            org_id,
            name: require_text(&req.admin_name, "admin_name")?,
            surname: require_text(&req.admin_surname, "admin_surname")?,
            email: require_text(&req.admin_email, "admin_email")?.to_lowercase(),
            password_hash: hash_password(&req.admin_password)?,
            must_change_password: false,
            role_ids: vec![admin_role_id],
            list_ids: Vec::new(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO organizations (id, code, name, status, max_lists, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(org_id.to_string())
        .bind(&code)
        .bind(&name)
        .bind(OrganizationStatus::Active.as_str())
        .bind(req.max_lists)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, "an organization with this code already exists"))?;

        sqlx::query(
            "INSERT INTO roles (id, org_id, list_id, name, color, level, created_at, updated_at) \
             VALUES (?, ?, NULL, ?, NULL, ?, ?, ?)",
        )
        .bind(admin_role_id.to_string())
        .bind(org_id.to_string())
        .bind(ADMIN_ROLE_NAME)
        .bind(ADMIN_ROLE_LEVEL)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) SELECT ?, id FROM permissions")
            .bind(admin_role_id.to_string())
            .execute(&mut *tx)
            .await?;

        let admin_user_id = insert_user(&mut tx, &admin).await?;
        tx.commit().await?;

        tracing::info!(org_id = %org_id, code = %code, admin_user_id = %admin_user_id, "organization bootstrapped");

        Ok(BootstrappedOrganization {
            organization: self.by_code(&code).await?,
            admin_role_id,
            admin_user_id,
        })
    }
}

/// Upper-cased, non-blank, at most seven characters.
fn normalize_code(code: &str) -> AppResult<String> {
    let code = require_text(code, "code")?.to_uppercase();
    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(AppError::bad_request(format!(
            "code must be at most {} characters",
            MAX_CODE_LENGTH
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code(" lic0001 ").unwrap(), "LIC0001");
        assert!(matches!(normalize_code("  "), Err(AppError::BadRequest(_))));
        assert!(matches!(normalize_code("LIC00001"), Err(AppError::BadRequest(_))));
    }
}
