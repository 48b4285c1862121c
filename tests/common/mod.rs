#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use votegate::authz::{AuthorizationEngine, SqliteAuthzStore};
use votegate::db;
use votegate::models::organization::OrganizationBootstrap;
use votegate::services::Services;
use votegate::utils::hash_password;

pub const PASSWORD: &str = "password123";
pub const MAX_UPLOAD_BYTES: i64 = 1024 * 1024;

/// A migrated temp-file database with one bootstrapped organization and two lists.
pub struct Fixture {
    _dir: TempDir,
    pub pool: SqlitePool,
    pub engine: AuthorizationEngine,
    pub services: Services,
    pub org_id: Uuid,
    pub org_code: String,
    pub admin_id: Uuid,
    pub list_x: Uuid,
    pub list_y: Uuid,
}

pub async fn fixture() -> Result<Fixture> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");
    let pool = db::init(&format!("sqlite://{}", db_path.display())).await?;

    let engine = AuthorizationEngine::new(Arc::new(SqliteAuthzStore::new(pool.clone())));
    let services = Services::new(pool.clone(), engine.clone(), MAX_UPLOAD_BYTES);

    let org = bootstrap(&services, "LIC0001").await?;
    let list_x = insert_list(&pool, org.org_id, "Student Voice").await?;
    let list_y = insert_list(&pool, org.org_id, "Green Future").await?;

    Ok(Fixture {
        _dir: dir,
        pool,
        engine,
        services,
        org_id: org.org_id,
        org_code: "LIC0001".to_string(),
        admin_id: org.admin_id,
        list_x,
        list_y,
    })
}

pub struct Tenant {
    pub org_id: Uuid,
    pub admin_id: Uuid,
}

/// Another organization with its own administrator.
pub async fn bootstrap(services: &Services, code: &str) -> Result<Tenant> {
    let created = services
        .organizations
        .bootstrap(OrganizationBootstrap {
            code: code.to_string(),
            name: format!("School {}", code),
            max_lists: Some(5),
            admin_name: "Ada".to_string(),
            admin_surname: "Admin".to_string(),
            admin_email: format!("admin@{}.example", code.to_lowercase()),
            admin_password: PASSWORD.to_string(),
        })
        .await?;
    Ok(Tenant {
        org_id: created.organization.id,
        admin_id: created.admin_user_id,
    })
}

pub async fn permission_id(pool: &SqlitePool, name: &str) -> Result<Uuid> {
    let id: String = sqlx::query_scalar("SELECT id FROM permissions WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .with_context(|| format!("unknown permission {}", name))?;
    Ok(Uuid::parse_str(&id)?)
}

pub async fn insert_list(pool: &SqlitePool, org_id: Uuid, name: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO lists (id, org_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(org_id.to_string())
        .bind(name)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(id)
}

/// Writes a role straight to storage, bypassing the gate.
pub async fn insert_role(
    pool: &SqlitePool,
    org_id: Uuid,
    list_id: Option<Uuid>,
    level: i64,
    permissions: &[&str],
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO roles (id, org_id, list_id, name, level, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(org_id.to_string())
    .bind(list_id.map(|l| l.to_string()))
    .bind(format!("role-{}", id.simple()))
    .bind(level)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    for name in permissions {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(permission_id(pool, name).await?.to_string())
            .execute(pool)
            .await?;
    }
    Ok(id)
}

/// Writes a user straight to storage with the given roles and lists.
pub async fn insert_user(pool: &SqlitePool, org_id: Uuid, roles: &[Uuid], lists: &[Uuid]) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, org_id, name, surname, email, password_hash, must_change_password, created_at, updated_at) \
         VALUES (?, ?, 'Test', 'User', ?, ?, 0, ?, ?)",
    )
    .bind(id.to_string())
    .bind(org_id.to_string())
    .bind(format!("{}@example.com", id.simple()))
    .bind(hash_password(PASSWORD)?)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    for role in roles {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(role.to_string())
            .execute(pool)
            .await?;
    }
    for list in lists {
        sqlx::query("INSERT INTO user_lists (user_id, list_id) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(list.to_string())
            .execute(pool)
            .await?;
    }
    Ok(id)
}

pub async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}
