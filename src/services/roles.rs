use std::collections::HashMap;

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{dedup, ensure_positive_level, optional_text, require_text, validate_color};
use crate::authz::permissions::{VIEW_ALL_ROLE_LIST, VIEW_ALL_ROLE_ORGANIZATION};
use crate::authz::{policy, AuthorizationEngine, Guard, Scope, Target};
use crate::db::row_parsers::{permission_from_row, placeholders, role_from_row, uuid_col};
use crate::errors::{AppError, AppResult};
use crate::models::role::{Role, RoleCatalog, RoleCreateRequest, RoleUpdateRequest};
use crate::utils::utc_now;

const ROLE_COLUMNS: &str = "id, org_id, list_id, name, color, level, created_at, updated_at";
const DUPLICATE_ROLE: &str = "a role with this name already exists in this scope";

#[derive(Clone)]
pub struct RoleService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl RoleService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    /// Roles the caller may browse, split by scope, plus the caller's own
    /// permissions. Without the org-wide view permission only the roles of
    /// lists where the caller holds the list view permission are shown.
    pub async fn catalog(&self, actor: Uuid) -> AppResult<RoleCatalog> {
        let me = self.engine.resolve_actor(actor).await?;
        let grants = self.engine.oracle().grants(actor).await?;
        let permissions = grants.permissions();

        if grants.has(VIEW_ALL_ROLE_ORGANIZATION) {
            let roles = self.load("org_id = ?", &[me.org_id]).await?;
            let (org_roles, list_roles) = roles.into_iter().partition(Role::is_org_level);
            return Ok(RoleCatalog {
                org_roles,
                list_roles,
                can_view_all_org: true,
                restricted_to_list: None,
                permissions,
            });
        }

        let member_of = sqlx::query("SELECT list_id FROM user_lists WHERE user_id = ?")
            .bind(actor.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| uuid_col(row, "list_id"))
            .collect::<AppResult<Vec<_>>>()?;
        let allowed: Vec<Uuid> = member_of
            .into_iter()
            .filter(|list| grants.has_on_list(*list, VIEW_ALL_ROLE_LIST))
            .collect();

        if allowed.is_empty() {
            return Err(AppError::forbidden("you do not have permission to view roles"));
        }

        let filter = format!("list_id IN ({})", placeholders(allowed.len()));
        let list_roles = self.load(&filter, &allowed).await?;

        Ok(RoleCatalog {
            org_roles: Vec::new(),
            list_roles,
            can_view_all_org: false,
            restricted_to_list: (allowed.len() == 1).then(|| allowed[0]),
            permissions,
        })
    }

    /// Every role of the organization, or of one list.
    pub async fn list_visible(&self, actor: Uuid, list_id: Option<Uuid>) -> AppResult<Vec<Role>> {
        match list_id {
            None => {
                let auth = self
                    .engine
                    .authorize(actor, Guard::new(Target::Organization, policy::VIEW_ROLES))
                    .await?;
                self.load("org_id = ?", &[auth.org_id()]).await
            }
            Some(list) => {
                self.engine
                    .authorize(actor, Guard::new(Target::List(list), policy::VIEW_ROLES))
                    .await?;
                self.load("list_id = ?", &[list]).await
            }
        }
    }

    pub async fn get(&self, actor: Uuid, role_id: Uuid) -> AppResult<Role> {
        self.engine
            .authorize(actor, Guard::new(Target::Role(role_id), policy::VIEW_ROLES))
            .await?;
        self.fetch(role_id).await
    }

    /// The caller's own roles.
    pub async fn mine(&self, actor: Uuid) -> AppResult<Vec<Role>> {
        self.engine.resolve_actor(actor).await?;
        self.load("id IN (SELECT role_id FROM user_roles WHERE user_id = ?)", &[actor])
            .await
    }

    pub async fn create(&self, actor: Uuid, req: RoleCreateRequest) -> AppResult<Role> {
        let name = require_text(&req.name, "name")?;
        ensure_positive_level(req.level)?;
        let color = validate_color(req.color.as_deref(), "color")?;
        let permission_ids = dedup(&req.permission_ids);

        let target = req.list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(
                actor,
                Guard::new(target, policy::CREATE_ROLE)
                    .with_level(req.level)
                    .with_permissions(&permission_ids),
            )
            .await?;

        let id = Uuid::new_v4();
        let now = utc_now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO roles (id, org_id, list_id, name, color, level, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(auth.org_id().to_string())
        .bind(req.list_id.map(|l| l.to_string()))
        .bind(&name)
        .bind(&color)
        .bind(req.level)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, DUPLICATE_ROLE))?;

        replace_permissions(&mut tx, id, &permission_ids).await?;
        tx.commit().await?;

        tracing::info!(
            role_id = %id,
            actor_id = %actor,
            level = req.level,
            list_id = ?req.list_id,
            "role created"
        );

        self.fetch(id).await
    }

    pub async fn update(&self, actor: Uuid, role_id: Uuid, req: RoleUpdateRequest) -> AppResult<Role> {
        let name = optional_text(req.name.as_deref(), "name")?;
        if let Some(level) = req.level {
            ensure_positive_level(level)?;
        }
        let color = validate_color(req.color.as_deref(), "color")?;
        let permission_ids = req.permission_ids.as_deref().map(dedup);

        let mut guard = Guard::new(Target::Role(role_id), policy::UPDATE_ROLE);
        if let Some(level) = req.level {
            guard = guard.with_level(level);
        }
        if let Some(ids) = &permission_ids {
            guard = guard.with_permissions(ids);
        }
        self.engine.authorize(actor, guard).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE roles SET name = COALESCE(?, name), color = COALESCE(?, color), \
             level = COALESCE(?, level), updated_at = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&color)
        .bind(req.level)
        .bind(utc_now().to_rfc3339())
        .bind(role_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, DUPLICATE_ROLE))?;

        if let Some(ids) = &permission_ids {
            replace_permissions(&mut tx, role_id, ids).await?;
        }
        tx.commit().await?;

        tracing::info!(role_id = %role_id, actor_id = %actor, "role updated");
        self.fetch(role_id).await
    }

    /// Removes the role, its permission links and every user membership.
    pub async fn delete(&self, actor: Uuid, role_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(actor, Guard::new(Target::Role(role_id), policy::DELETE_ROLE))
            .await?;

        let mut tx = self.pool.begin().await?;
        for sql in [
            "DELETE FROM user_roles WHERE role_id = ?",
            "DELETE FROM role_permissions WHERE role_id = ?",
            "DELETE FROM roles WHERE id = ?",
        ] {
            sqlx::query(sql).bind(role_id.to_string()).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::info!(role_id = %role_id, actor_id = %actor, "role deleted");
        Ok(())
    }

    /// Roles the caller could hand to a user created in the organization or
    /// in one list: strictly below the caller's authority in each role's scope.
    pub async fn assignable(&self, actor: Uuid, list_id: Option<Uuid>) -> AppResult<Vec<Role>> {
        let target = list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::CREATE_USER))
            .await?;
        let org_id = auth.org_id();
        let hierarchy = self.engine.hierarchy();

        let org_authority = hierarchy.authority(actor, Scope::Organization(org_id)).await?;
        let mut roles = match list_id {
            None => self.load("org_id = ? AND list_id IS NULL", &[org_id]).await?,
            Some(list) => {
                let mut roles = self.load("list_id = ?", &[list]).await?;
                if auth.org_wide {
                    roles.extend(self.load("org_id = ? AND list_id IS NULL", &[org_id]).await?);
                }
                roles
            }
        };
        let list_authority = match list_id {
            Some(list) => hierarchy.authority(actor, Scope::List(list)).await?,
            None => 0,
        };

        roles.retain(|role| {
            let ceiling = if role.is_org_level() { org_authority } else { list_authority };
            role.level < ceiling
        });
        Ok(roles)
    }

    pub async fn assign_to_user(&self, actor: Uuid, user_id: Uuid, role_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(
                actor,
                Guard::new(Target::User(user_id), policy::ASSIGN_ROLE).with_roles(&[role_id]),
            )
            .await?;

        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id.to_string())
            .bind(role_id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id = %user_id, role_id = %role_id, actor_id = %actor, "role assigned");
        Ok(())
    }

    pub async fn revoke_from_user(&self, actor: Uuid, user_id: Uuid, role_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(
                actor,
                Guard::new(Target::User(user_id), policy::ASSIGN_ROLE).with_roles(&[role_id]),
            )
            .await?;

        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id.to_string())
            .bind(role_id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user does not hold this role"));
        }

        tracing::info!(user_id = %user_id, role_id = %role_id, actor_id = %actor, "role revoked");
        Ok(())
    }

    async fn fetch(&self, role_id: Uuid) -> AppResult<Role> {
        self.load("id = ?", &[role_id])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found("role not found"))
    }

    /// Roles matching `filter` (with one `?` per id in `binds`), permissions attached.
    async fn load(&self, filter: &str, binds: &[Uuid]) -> AppResult<Vec<Role>> {
        let sql = format!(
            "SELECT {} FROM roles WHERE {} ORDER BY level DESC, name",
            ROLE_COLUMNS, filter
        );
        let mut query = sqlx::query(&sql);
        for id in binds {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;
        let mut roles = rows.iter().map(role_from_row).collect::<AppResult<Vec<_>>>()?;
        if roles.is_empty() {
            return Ok(roles);
        }

        let sql = format!(
            "SELECT rp.role_id, p.id, p.name, p.description FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id IN ({}) ORDER BY p.name",
            placeholders(roles.len())
        );
        let mut query = sqlx::query(&sql);
        for role in &roles {
            query = query.bind(role.id.to_string());
        }
        let mut by_role: HashMap<Uuid, Vec<_>> = HashMap::new();
        for row in query.fetch_all(&self.pool).await? {
            by_role
                .entry(uuid_col(&row, "role_id")?)
                .or_default()
                .push(permission_from_row(&row)?);
        }
        for role in &mut roles {
            role.permissions = by_role.remove(&role.id).unwrap_or_default();
        }
        Ok(roles)
    }
}

async fn replace_permissions(
    tx: &mut Transaction<'_, Sqlite>,
    role_id: Uuid,
    permission_ids: &[Uuid],
) -> AppResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
        .bind(role_id.to_string())
        .execute(&mut **tx)
        .await?;
    for permission_id in permission_ids {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(role_id.to_string())
            .bind(permission_id.to_string())
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
