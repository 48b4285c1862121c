use std::collections::HashSet;

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{dedup, optional_text, require_text};
use crate::authz::permissions::CREATE_USER_FOR_ORGANIZATION;
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::{db_user_from_row, placeholders, uuid_col};
use crate::errors::{AppError, AppResult};
use crate::models::user::{
    ChangePasswordRequest, DbUser, User, UserCreateRequest, UserDetail, UserUpdateRequest, UserUpdateResponse,
};
use crate::utils::{generate_temporary_password, hash_password, utc_now, validate_password, verify_password};

const USER_COLUMNS: &str =
    "id, org_id, name, surname, email, password_hash, must_change_password, created_at, updated_at, deleted_at";
const DUPLICATE_EMAIL: &str = "a user with this email already exists";

/// A user row ready to be written, already authorized.
#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub org_id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub must_change_password: bool,
    pub role_ids: Vec<Uuid>,
    pub list_ids: Vec<Uuid>,
}

#[derive(Debug)]
struct PlannedUpdate {
    user_id: Uuid,
    name: Option<String>,
    surname: Option<String>,
    email: Option<String>,
    temporary_password: Option<String>,
    add_lists: Vec<Uuid>,
    remove_lists: Vec<Uuid>,
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
}

impl UserService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine) -> Self {
        Self { pool, engine }
    }

    /// Creates a user with its initial roles and lists. Org-wide creators may
    /// place the user anywhere in the organization; list-bound creators must
    /// name exactly one list they manage.
    pub async fn create(&self, actor: Uuid, req: UserCreateRequest) -> AppResult<UserDetail> {
        let new_user = self.plan_create(actor, req).await?;

        let mut tx = self.pool.begin().await?;
        let id = insert_user(&mut tx, &new_user).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %id,
            actor_id = %actor,
            roles = new_user.role_ids.len(),
            lists = new_user.list_ids.len(),
            "user created"
        );
        self.detail(id).await
    }

    /// All or nothing: every entry is authorized before the first insert.
    pub async fn create_batch(&self, actor: Uuid, reqs: Vec<UserCreateRequest>) -> AppResult<Vec<UserDetail>> {
        if reqs.is_empty() {
            return Err(AppError::bad_request("no users to create"));
        }

        let mut seen = HashSet::new();
        for req in &reqs {
            if !seen.insert(req.email.trim().to_lowercase()) {
                return Err(AppError::conflict(format!("email {} appears more than once", req.email.trim())));
            }
        }

        let mut planned = Vec::with_capacity(reqs.len());
        for req in reqs {
            planned.push(self.plan_create(actor, req).await?);
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(planned.len());
        for new_user in &planned {
            ids.push(insert_user(&mut tx, new_user).await?);
        }
        tx.commit().await?;

        tracing::info!(actor_id = %actor, count = ids.len(), "users created");

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            created.push(self.detail(id).await?);
        }
        Ok(created)
    }

    /// One user; the caller when `user_id` is omitted.
    pub async fn get(&self, actor: Uuid, user_id: Option<Uuid>) -> AppResult<UserDetail> {
        let user_id = user_id.unwrap_or(actor);
        self.engine
            .authorize(actor, Guard::new(Target::User(user_id), policy::VIEW_USER))
            .await?;
        self.detail(user_id).await
    }

    /// Users of the organization, or members of one list.
    pub async fn list_visible(&self, actor: Uuid, list_id: Option<Uuid>) -> AppResult<Vec<User>> {
        let target = list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::VIEW_USERS))
            .await?;

        let rows = match list_id {
            None => {
                let sql = format!(
                    "SELECT {} FROM users WHERE org_id = ? AND deleted_at IS NULL ORDER BY surname, name",
                    USER_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(auth.org_id().to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(list) => {
                let sql = format!(
                    "SELECT {} FROM users WHERE deleted_at IS NULL \
                     AND id IN (SELECT user_id FROM user_lists WHERE list_id = ?) ORDER BY surname, name",
                    USER_COLUMNS
                );
                sqlx::query(&sql).bind(list.to_string()).fetch_all(&self.pool).await?
            }
        };

        rows.iter()
            .map(|row| db_user_from_row(row).and_then(User::try_from))
            .collect()
    }

    pub async fn update(&self, actor: Uuid, req: UserUpdateRequest) -> AppResult<UserUpdateResponse> {
        let planned = self.plan_update(actor, req).await?;

        let mut tx = self.pool.begin().await?;
        apply_update(&mut tx, &planned).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %planned.user_id,
            actor_id = %actor,
            password_reset = planned.temporary_password.is_some(),
            "user updated"
        );

        Ok(UserUpdateResponse {
            user: self.detail(planned.user_id).await?.user,
            temporary_password: planned.temporary_password,
        })
    }

    /// Every entry must name its user; nothing is written unless all pass.
    pub async fn update_batch(&self, actor: Uuid, reqs: Vec<UserUpdateRequest>) -> AppResult<Vec<UserUpdateResponse>> {
        let mut planned = Vec::with_capacity(reqs.len());
        for req in reqs {
            if req.id.is_none() {
                return Err(AppError::bad_request("every batch entry needs a user id"));
            }
            planned.push(self.plan_update(actor, req).await?);
        }

        let mut tx = self.pool.begin().await?;
        for update in &planned {
            apply_update(&mut tx, update).await?;
        }
        tx.commit().await?;

        tracing::info!(actor_id = %actor, count = planned.len(), "users updated");

        let mut responses = Vec::with_capacity(planned.len());
        for update in planned {
            responses.push(UserUpdateResponse {
                user: self.detail(update.user_id).await?.user,
                temporary_password: update.temporary_password,
            });
        }
        Ok(responses)
    }

    /// Soft delete. The user disappears from every lookup, its rows stay.
    pub async fn delete(&self, actor: Uuid, user_id: Uuid) -> AppResult<()> {
        self.delete_batch(actor, &[user_id]).await
    }

    pub async fn delete_batch(&self, actor: Uuid, user_ids: &[Uuid]) -> AppResult<()> {
        let user_ids = dedup(user_ids);
        if user_ids.is_empty() {
            return Err(AppError::bad_request("no users to delete"));
        }
        if user_ids.contains(&actor) {
            return Err(AppError::bad_request("you cannot delete your own account"));
        }
        for user_id in &user_ids {
            let held = self.role_ids(*user_id).await?;
            self.engine
                .authorize(
                    actor,
                    Guard::new(Target::User(*user_id), policy::DELETE_USER).with_roles(&held),
                )
                .await?;
        }

        let now = utc_now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for user_id in &user_ids {
            sqlx::query("UPDATE users SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(&now)
                .bind(&now)
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(actor_id = %actor, count = user_ids.len(), "users deleted");
        Ok(())
    }

    /// The caller's own password. Clears the forced-change flag.
    pub async fn change_password(&self, actor: Uuid, req: ChangePasswordRequest) -> AppResult<()> {
        let user = self.fetch_db_user(actor).await?;
        if !verify_password(&req.current_password, &user.password_hash)? {
            return Err(AppError::bad_request("current password is incorrect"));
        }
        let password_hash = hash_password(&req.new_password)?;

        sqlx::query("UPDATE users SET password_hash = ?, must_change_password = 0, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(utc_now().to_rfc3339())
            .bind(actor.to_string())
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id = %actor, "password changed");
        Ok(())
    }

    /// Login lookup: organization code, email and password must all match
    /// an active organization and a live user.
    pub async fn authenticate(&self, org_code: &str, email: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::unauthorized("invalid credentials");

        let sql = format!(
            "SELECT {} FROM users WHERE email = ? AND deleted_at IS NULL \
             AND org_id = (SELECT id FROM organizations WHERE code = ? AND status = 'active')",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email.trim().to_lowercase())
            .bind(org_code.trim().to_uppercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(invalid)?;
        let user = db_user_from_row(&row)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(invalid());
        }

        User::try_from(user)
    }

    /// A live user with its role and list ids. No authorization.
    pub async fn detail(&self, user_id: Uuid) -> AppResult<UserDetail> {
        let user = User::try_from(self.fetch_db_user(user_id).await?)?;

        let role_ids = self.role_ids(user_id).await?;
        let list_ids = sqlx::query("SELECT list_id FROM user_lists WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| uuid_col(row, "list_id"))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(UserDetail { user, role_ids, list_ids })
    }

    async fn fetch_db_user(&self, user_id: Uuid) -> AppResult<DbUser> {
        let sql = format!("SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;
        db_user_from_row(&row)
    }

    async fn plan_create(&self, actor: Uuid, req: UserCreateRequest) -> AppResult<NewUser> {
        let name = require_text(&req.name, "name")?;
        let surname = require_text(&req.surname, "surname")?;
        let email = require_text(&req.email, "email")?.to_lowercase();
        validate_password(&req.password)?;
        let role_ids = dedup(&req.role_ids);
        let list_ids = dedup(&req.list_ids);

        let org_wide = self
            .engine
            .oracle()
            .has_permission(actor, CREATE_USER_FOR_ORGANIZATION)
            .await?;
        let target = match (org_wide, list_ids.as_slice()) {
            (true, _) | (false, []) => Target::Organization,
            (false, [list]) => Target::List(*list),
            (false, _) => {
                return Err(AppError::bad_request(
                    "users created for a list must join exactly one list",
                ))
            }
        };

        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::CREATE_USER).with_roles(&role_ids))
            .await?;
        let org_id = auth.org_id();

        if auth.org_wide && !list_ids.is_empty() {
            self.ensure_lists_in_org(org_id, &list_ids).await?;
        }
        self.ensure_roles_follow_lists(&role_ids, &list_ids).await?;

        Ok(NewUser {
            org_id,
            name,
            surname,
            email,
            password_hash: hash_password(&req.password)?,
            must_change_password: true,
            role_ids,
            list_ids,
        })
    }

    async fn plan_update(&self, actor: Uuid, req: UserUpdateRequest) -> AppResult<PlannedUpdate> {
        let user_id = req.id.unwrap_or(actor);
        let name = optional_text(req.name.as_deref(), "name")?;
        let surname = optional_text(req.surname.as_deref(), "surname")?;
        let email = optional_text(req.email.as_deref(), "email")?.map(|e| e.to_lowercase());
        let add_lists = dedup(&req.add_lists);
        let remove_lists = dedup(&req.remove_lists);

        self.engine
            .authorize(actor, Guard::new(Target::User(user_id), policy::UPDATE_USER))
            .await?;

        let other = user_id != actor;
        if other {
            // Another user can only be changed from strictly above every role they hold.
            let held = self.role_ids(user_id).await?;
            self.engine
                .authorize(actor, Guard::new(Target::User(user_id), policy::MANAGE_USER).with_roles(&held))
                .await?;
        } else if req.reset_password {
            self.engine
                .authorize(actor, Guard::new(Target::User(user_id), policy::MANAGE_USER))
                .await?;
        }
        for list in &add_lists {
            self.engine
                .authorize(actor, Guard::new(Target::List(*list), policy::MANAGE_USER))
                .await?;
        }
        for list in &remove_lists {
            let dropped = if other {
                self.roles_on_list(user_id, *list).await?
            } else {
                Vec::new()
            };
            self.engine
                .authorize(actor, Guard::new(Target::List(*list), policy::MANAGE_USER).with_roles(&dropped))
                .await?;
        }

        Ok(PlannedUpdate {
            user_id,
            name,
            surname,
            email,
            temporary_password: req.reset_password.then(generate_temporary_password),
            add_lists,
            remove_lists,
        })
    }

    async fn role_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query("SELECT role_id FROM user_roles WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| uuid_col(row, "role_id"))
            .collect()
    }

    /// Roles of the user bound to `list_id`; leaving the list drops them.
    async fn roles_on_list(&self, user_id: Uuid, list_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query(
            "SELECT ur.role_id AS role_id FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = ? AND r.list_id = ?",
        )
        .bind(user_id.to_string())
        .bind(list_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| uuid_col(row, "role_id"))
        .collect()
    }

    /// A list-scoped role only makes sense for a member of its list.
    async fn ensure_roles_follow_lists(&self, role_ids: &[Uuid], list_ids: &[Uuid]) -> AppResult<()> {
        if role_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "SELECT id, list_id FROM roles WHERE list_id IS NOT NULL AND id IN ({})",
            placeholders(role_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in role_ids {
            query = query.bind(id.to_string());
        }
        for row in query.fetch_all(&self.pool).await? {
            let list_id = uuid_col(&row, "list_id")?;
            if !list_ids.contains(&list_id) {
                return Err(AppError::bad_request(format!(
                    "role {} is bound to a list the user does not join",
                    uuid_col(&row, "id")?
                )));
            }
        }
        Ok(())
    }

    async fn ensure_lists_in_org(&self, org_id: Uuid, list_ids: &[Uuid]) -> AppResult<()> {
        let sql = format!(
            "SELECT COUNT(*) FROM lists WHERE org_id = ? AND id IN ({})",
            placeholders(list_ids.len())
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(org_id.to_string());
        for id in list_ids {
            query = query.bind(id.to_string());
        }
        let found = query.fetch_one(&self.pool).await?;
        if found != list_ids.len() as i64 {
            return Err(AppError::not_found("list not found"));
        }
        Ok(())
    }
}

pub(crate) async fn insert_user(tx: &mut Transaction<'_, Sqlite>, user: &NewUser) -> AppResult<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, org_id, name, surname, email, password_hash, must_change_password, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user.org_id.to_string())
    .bind(&user.name)
    .bind(&user.surname)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.must_change_password)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::unique_violation(e, DUPLICATE_EMAIL))?;

    for list_id in &user.list_ids {
        sqlx::query("INSERT INTO user_lists (user_id, list_id) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(list_id.to_string())
            .execute(&mut **tx)
            .await?;
    }
    for role_id in &user.role_ids {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(role_id.to_string())
            .execute(&mut **tx)
            .await?;
    }

    Ok(id)
}

async fn apply_update(tx: &mut Transaction<'_, Sqlite>, update: &PlannedUpdate) -> AppResult<()> {
    let user_id = update.user_id.to_string();

    sqlx::query(
        "UPDATE users SET name = COALESCE(?, name), surname = COALESCE(?, surname), \
         email = COALESCE(?, email), updated_at = ? WHERE id = ?",
    )
    .bind(&update.name)
    .bind(&update.surname)
    .bind(&update.email)
    .bind(utc_now().to_rfc3339())
    .bind(&user_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::unique_violation(e, DUPLICATE_EMAIL))?;

    if let Some(password) = &update.temporary_password {
        sqlx::query("UPDATE users SET password_hash = ?, must_change_password = 1 WHERE id = ?")
            .bind(hash_password(password)?)
            .bind(&user_id)
            .execute(&mut **tx)
            .await?;
    }

    for list_id in &update.add_lists {
        sqlx::query("INSERT OR IGNORE INTO user_lists (user_id, list_id) VALUES (?, ?)")
            .bind(&user_id)
            .bind(list_id.to_string())
            .execute(&mut **tx)
            .await?;
    }

    // Leaving a list drops the roles bound to it.
    for list_id in &update.remove_lists {
        sqlx::query("DELETE FROM user_lists WHERE user_id = ? AND list_id = ?")
            .bind(&user_id)
            .bind(list_id.to_string())
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id IN (SELECT id FROM roles WHERE list_id = ?)")
            .bind(&user_id)
            .bind(list_id.to_string())
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
