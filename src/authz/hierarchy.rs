use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use super::store::{AuthzStore, RoleRecord, Target};
use crate::errors::{AppError, AppResult};

/// Where a level is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Organization(Uuid),
    List(Uuid),
}

impl Scope {
    pub fn of_role(role: &RoleRecord) -> Self {
        match role.list_id {
            Some(list) => Scope::List(list),
            None => Scope::Organization(role.org_id),
        }
    }
}

fn max_level(roles: &[RoleRecord], keep: impl Fn(&RoleRecord) -> bool) -> i64 {
    roles.iter().filter(|r| keep(r)).map(|r| r.level).max().unwrap_or(0)
}

/// Computes how much authority a user holds in a scope.
#[derive(Clone)]
pub struct HierarchyResolver {
    store: Arc<dyn AuthzStore>,
}

impl HierarchyResolver {
    pub fn new(store: Arc<dyn AuthzStore>) -> Self {
        Self { store }
    }

    /// Highest level among the user's org-level roles of `org_id`, or 0.
    pub async fn max_level_in_org(&self, user_id: Uuid, org_id: Uuid) -> AppResult<i64> {
        let roles = self.store.user_roles(user_id).await?;
        Ok(max_level(&roles, |r| r.org_id == org_id && r.list_id.is_none()))
    }

    /// Highest level among the user's roles bound exactly to `list_id`, or 0.
    pub async fn max_level_in_list(&self, user_id: Uuid, list_id: Uuid) -> AppResult<i64> {
        let roles = self.store.user_roles(user_id).await?;
        Ok(max_level(&roles, |r| r.list_id == Some(list_id)))
    }

    /// Ceiling for role mutations in `scope`. Org-level roles reach into
    /// every list of their organization.
    pub async fn authority(&self, user_id: Uuid, scope: Scope) -> AppResult<i64> {
        let roles = self.store.user_roles(user_id).await?;
        match scope {
            Scope::Organization(org) => Ok(max_level(&roles, |r| r.org_id == org && r.list_id.is_none())),
            Scope::List(list) => {
                let in_list = max_level(&roles, |r| r.list_id == Some(list));
                let in_org = match self.store.scope_of(Target::List(list)).await? {
                    Some(owner) => max_level(&roles, |r| r.org_id == owner.org_id && r.list_id.is_none()),
                    None => 0,
                };
                Ok(in_list.max(in_org))
            }
        }
    }

    /// Strict: a level equal to the actor's authority is rejected.
    pub async fn ensure_below(&self, user_id: Uuid, scope: Scope, level: i64) -> AppResult<()> {
        let authority = self.authority(user_id, scope).await?;
        if level < authority {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "insufficient authority for a role of level {}",
                level
            )))
        }
    }

    /// Every id in `permission_ids` must be held by the user right now.
    /// Nothing is granted when a single one is missing.
    pub async fn ensure_possessed(&self, user_id: Uuid, permission_ids: &[Uuid]) -> AppResult<()> {
        if permission_ids.is_empty() {
            return Ok(());
        }
        let held: HashSet<Uuid> = self
            .store
            .user_grants(user_id)
            .await?
            .into_iter()
            .map(|g| g.permission.id)
            .collect();
        if permission_ids.iter().all(|id| held.contains(id)) {
            Ok(())
        } else {
            Err(AppError::forbidden("cannot assign permissions you do not hold"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, HierarchyResolver) {
        let store = Arc::new(MemoryStore::new());
        let resolver = HierarchyResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn levels_default_to_zero() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let list = store.add_list(org);
        let user = store.add_user(org);

        assert_eq!(resolver.max_level_in_org(user, org).await.unwrap(), 0);
        assert_eq!(resolver.max_level_in_list(user, list).await.unwrap(), 0);
        assert_eq!(resolver.authority(user, Scope::List(list)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn org_and_list_levels_are_kept_apart() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let list = store.add_list(org);
        let other = store.add_list(org);
        let user = store.add_user(org);
        let org_role = store.add_role(org, None, 5, &[]);
        let list_role = store.add_role(org, Some(list), 7, &[]);
        store.grant_role(user, org_role);
        store.grant_role(user, list_role);

        assert_eq!(resolver.max_level_in_org(user, org).await.unwrap(), 5);
        assert_eq!(resolver.max_level_in_list(user, list).await.unwrap(), 7);
        assert_eq!(resolver.max_level_in_list(user, other).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn org_level_roles_reach_every_list() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let list = store.add_list(org);
        let user = store.add_user(org);
        let org_role = store.add_role(org, None, 5, &[]);
        store.grant_role(user, org_role);

        assert_eq!(resolver.authority(user, Scope::List(list)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn list_roles_do_not_reach_the_organization() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let list = store.add_list(org);
        let user = store.add_user(org);
        let list_role = store.add_role(org, Some(list), 8, &[]);
        store.grant_role(user, list_role);

        assert_eq!(resolver.authority(user, Scope::Organization(org)).await.unwrap(), 0);
        assert!(resolver
            .ensure_below(user, Scope::Organization(org), 1)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn foreign_org_roles_grant_nothing() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let foreign = store.add_organization();
        let user = store.add_user(org);
        let role = store.add_role(foreign, None, 9, &[]);
        store.grant_role(user, role);

        assert_eq!(resolver.max_level_in_org(user, org).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn equality_is_rejected() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let user = store.add_user(org);
        let role = store.add_role(org, None, 5, &[]);
        store.grant_role(user, role);

        resolver.ensure_below(user, Scope::Organization(org), 4).await.unwrap();
        assert!(resolver
            .ensure_below(user, Scope::Organization(org), 5)
            .await
            .unwrap_err()
            .is_forbidden());
        assert!(resolver
            .ensure_below(user, Scope::Organization(org), 6)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn possession_is_all_or_nothing() {
        let (store, resolver) = setup();
        let org = store.add_organization();
        let held = store.add_permission("create_list");
        let missing = store.add_permission("view_all_lists");
        let role = store.add_role(org, None, 5, &[held]);
        let user = store.add_user(org);
        store.grant_role(user, role);

        resolver.ensure_possessed(user, &[]).await.unwrap();
        resolver.ensure_possessed(user, &[held]).await.unwrap();
        assert!(resolver
            .ensure_possessed(user, &[held, missing])
            .await
            .unwrap_err()
            .is_forbidden());
    }
}
