use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use super::store::{AuthzStore, RoleGrant};
use crate::errors::{AppError, AppResult};
use crate::models::role::Permission;

/// Snapshot of every (role, permission) pair a user holds at one instant.
#[derive(Debug, Clone, Default)]
pub struct Grants(Vec<RoleGrant>);

impl Grants {
    pub fn new(grants: Vec<RoleGrant>) -> Self {
        Self(grants)
    }

    /// Any role, any scope.
    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|g| g.permission.name == name)
    }

    /// Only roles bound exactly to `list_id`; org-level roles never count.
    pub fn has_on_list(&self, list_id: Uuid, name: &str) -> bool {
        self.0
            .iter()
            .any(|g| g.role.list_id == Some(list_id) && g.permission.name == name)
    }

    /// Lists on which a list-scoped role carries `name`.
    pub fn lists_with(&self, name: &str) -> HashSet<Uuid> {
        self.0
            .iter()
            .filter(|g| g.permission.name == name)
            .filter_map(|g| g.role.list_id)
            .collect()
    }

    pub fn permission_ids(&self) -> HashSet<Uuid> {
        self.0.iter().map(|g| g.permission.id).collect()
    }

    /// Distinct permissions, ordered by name.
    pub fn permissions(&self) -> Vec<Permission> {
        let mut by_name: BTreeMap<&str, &Permission> = BTreeMap::new();
        for grant in &self.0 {
            by_name.entry(grant.permission.name.as_str()).or_insert(&grant.permission);
        }
        by_name.into_values().cloned().collect()
    }
}

/// Boolean and set queries over a user's roles and their permissions.
///
/// Stateless: every call reads the store.
#[derive(Clone)]
pub struct PermissionOracle {
    store: Arc<dyn AuthzStore>,
}

impl PermissionOracle {
    pub fn new(store: Arc<dyn AuthzStore>) -> Self {
        Self { store }
    }

    pub async fn grants(&self, user_id: Uuid) -> AppResult<Grants> {
        Ok(Grants::new(self.store.user_grants(user_id).await?))
    }

    pub async fn has_permission(&self, user_id: Uuid, name: &str) -> AppResult<bool> {
        Ok(self.grants(user_id).await?.has(name))
    }

    pub async fn has_permission_on_list(&self, user_id: Uuid, list_id: Uuid, name: &str) -> AppResult<bool> {
        Ok(self.grants(user_id).await?.has_on_list(list_id, name))
    }

    pub async fn user_permissions(&self, user_id: Uuid) -> AppResult<Vec<Permission>> {
        Ok(self.grants(user_id).await?.permissions())
    }

    /// True when `target_user_id` is a member of at least one list on which
    /// `user_id` holds `name` through a list-scoped role.
    pub async fn check_shared_lists(&self, user_id: Uuid, target_user_id: Uuid, name: &str) -> AppResult<bool> {
        let grants = self.grants(user_id).await?;
        self.shares_list(&grants, target_user_id, name).await
    }

    pub(crate) async fn shares_list(&self, grants: &Grants, target_user_id: Uuid, name: &str) -> AppResult<bool> {
        let lists = grants.lists_with(name);
        if lists.is_empty() {
            return Ok(false);
        }
        let target_lists = self.store.user_lists(target_user_id).await?;
        Ok(target_lists.iter().any(|l| lists.contains(l)))
    }

    /// Ok when the user holds `org_permission` anywhere, or `list_permission`
    /// through a role bound to `list_id`; Forbidden(`message`) otherwise.
    pub async fn validate_permission(
        &self,
        user_id: Uuid,
        list_id: Option<Uuid>,
        org_permission: &str,
        list_permission: &str,
        message: &str,
    ) -> AppResult<()> {
        let grants = self.grants(user_id).await?;
        let allowed = grants.has(org_permission)
            || list_id.is_some_and(|list| grants.has_on_list(list, list_permission));
        if allowed {
            Ok(())
        } else {
            Err(AppError::forbidden(message))
        }
    }

    /// Lists of `org_id` the user may see for `name`: all of them when the
    /// permission is held at all, otherwise the lists the user belongs to.
    pub async fn lists_with_permission(&self, user_id: Uuid, org_id: Uuid, name: &str) -> AppResult<Vec<Uuid>> {
        if self.has_permission(user_id, name).await? {
            self.store.org_lists(org_id).await
        } else {
            self.store.user_lists(user_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        oracle: PermissionOracle,
        org: Uuid,
        list_x: Uuid,
        list_y: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let org = store.add_organization();
        let list_x = store.add_list(org);
        let list_y = store.add_list(org);
        let oracle = PermissionOracle::new(store.clone());
        Fixture { store, oracle, org, list_x, list_y }
    }

    #[tokio::test]
    async fn has_permission_ignores_scope() {
        let f = fixture();
        let perm = f.store.add_permission("create_campaign_list");
        let role = f.store.add_role(f.org, Some(f.list_x), 2, &[perm]);
        let user = f.store.add_user(f.org);
        f.store.grant_role(user, role);

        assert!(f.oracle.has_permission(user, "create_campaign_list").await.unwrap());
        assert!(!f.oracle.has_permission(user, "create_list").await.unwrap());
    }

    #[tokio::test]
    async fn list_permission_requires_exact_list() {
        let f = fixture();
        let perm = f.store.add_permission("create_campaign_list");
        let role = f.store.add_role(f.org, Some(f.list_x), 2, &[perm]);
        let user = f.store.add_user(f.org);
        f.store.grant_role(user, role);

        assert!(f.oracle.has_permission_on_list(user, f.list_x, "create_campaign_list").await.unwrap());
        assert!(!f.oracle.has_permission_on_list(user, f.list_y, "create_campaign_list").await.unwrap());
    }

    #[tokio::test]
    async fn org_roles_never_satisfy_list_checks() {
        let f = fixture();
        let perm = f.store.add_permission("create_campaign_list");
        let role = f.store.add_role(f.org, None, 9, &[perm]);
        let user = f.store.add_user(f.org);
        f.store.grant_role(user, role);

        assert!(!f.oracle.has_permission_on_list(user, f.list_x, "create_campaign_list").await.unwrap());
    }

    #[tokio::test]
    async fn user_permissions_are_deduplicated() {
        let f = fixture();
        let a = f.store.add_permission("view_all_lists");
        let b = f.store.add_permission("create_list");
        let r1 = f.store.add_role(f.org, None, 3, &[a, b]);
        let r2 = f.store.add_role(f.org, Some(f.list_x), 2, &[a]);
        let user = f.store.add_user(f.org);
        f.store.grant_role(user, r1);
        f.store.grant_role(user, r2);

        let names: Vec<String> = f
            .oracle
            .user_permissions(user)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["create_list".to_string(), "view_all_lists".to_string()]);
    }

    #[tokio::test]
    async fn shared_lists_need_list_scoped_grant() {
        let f = fixture();
        let perm = f.store.add_permission("update_user_list");
        let role = f.store.add_role(f.org, Some(f.list_x), 2, &[perm]);
        let manager = f.store.add_user(f.org);
        f.store.grant_role(manager, role);

        let member = f.store.add_user(f.org);
        f.store.join_list(member, f.list_x);
        let outsider = f.store.add_user(f.org);
        f.store.join_list(outsider, f.list_y);

        assert!(f.oracle.check_shared_lists(manager, member, "update_user_list").await.unwrap());
        assert!(!f.oracle.check_shared_lists(manager, outsider, "update_user_list").await.unwrap());
        assert!(!f.oracle.check_shared_lists(manager, member, "view_all_user_list").await.unwrap());
    }

    #[tokio::test]
    async fn validate_permission_accepts_either_half() {
        let f = fixture();
        let list_perm = f.store.add_permission("update_list_list");
        let role = f.store.add_role(f.org, Some(f.list_x), 2, &[list_perm]);
        let user = f.store.add_user(f.org);
        f.store.grant_role(user, role);

        f.oracle
            .validate_permission(user, Some(f.list_x), "update_list_organization", "update_list_list", "nope")
            .await
            .unwrap();

        let err = f
            .oracle
            .validate_permission(user, Some(f.list_y), "update_list_organization", "update_list_list", "nope")
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(err.to_string(), "forbidden: nope");

        let err = f
            .oracle
            .validate_permission(user, None, "update_list_organization", "update_list_list", "nope")
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn visible_lists_follow_the_permission() {
        let f = fixture();
        let perm = f.store.add_permission("view_all_lists");
        let role = f.store.add_role(f.org, None, 3, &[perm]);
        let admin = f.store.add_user(f.org);
        f.store.grant_role(admin, role);
        let member = f.store.add_user(f.org);
        f.store.join_list(member, f.list_y);

        let mut all = f.oracle.lists_with_permission(admin, f.org, "view_all_lists").await.unwrap();
        all.sort();
        let mut expected = vec![f.list_x, f.list_y];
        expected.sort();
        assert_eq!(all, expected);

        let own = f.oracle.lists_with_permission(member, f.org, "view_all_lists").await.unwrap();
        assert_eq!(own, vec![f.list_y]);
    }
}
