use std::sync::Arc;

use uuid::Uuid;

use super::hierarchy::{HierarchyResolver, Scope};
use super::oracle::{Grants, PermissionOracle};
use super::policy::Policy;
use super::principal::Principal;
use super::store::{AuthzStore, EntityScope, Target};
use crate::errors::{AppError, AppResult};

/// Outcome of one pass through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    TenancyFailed,
    PermissionDenied,
    HierarchyViolation,
    Authorized,
}

/// A guarded operation: its target, its policy, and whatever it intends to
/// hand out (levels, roles, permissions).
#[derive(Debug, Clone)]
pub struct Guard {
    target: Target,
    policy: Policy,
    levels: Vec<i64>,
    roles: Vec<Uuid>,
    permissions: Vec<Uuid>,
}

impl Guard {
    pub fn new(target: Target, policy: Policy) -> Self {
        Self {
            target,
            policy,
            levels: Vec::new(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// A role level the operation will write in the target's scope.
    pub fn with_level(mut self, level: i64) -> Self {
        self.levels.push(level);
        self
    }

    /// Roles the operation will hand to a user; each is checked in its own scope.
    pub fn with_roles(mut self, role_ids: &[Uuid]) -> Self {
        self.roles.extend_from_slice(role_ids);
        self
    }

    /// Permissions the operation will put on a role.
    pub fn with_permissions(mut self, permission_ids: &[Uuid]) -> Self {
        self.permissions.extend_from_slice(permission_ids);
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }
}

/// Result of a successful gate pass.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub actor: Principal,
    pub target: EntityScope,
    /// The org-wide permission of the policy carried the check, as opposed
    /// to a list-bound grant or ownership.
    pub org_wide: bool,
}

impl Authorized {
    pub fn actor_id(&self) -> Uuid {
        self.actor.user_id
    }

    pub fn org_id(&self) -> Uuid {
        self.actor.org_id
    }
}

#[derive(Clone)]
pub struct AuthorizationEngine {
    store: Arc<dyn AuthzStore>,
    oracle: PermissionOracle,
    hierarchy: HierarchyResolver,
}

impl AuthorizationEngine {
    pub fn new(store: Arc<dyn AuthzStore>) -> Self {
        Self {
            oracle: PermissionOracle::new(store.clone()),
            hierarchy: HierarchyResolver::new(store.clone()),
            store,
        }
    }

    pub fn oracle(&self) -> &PermissionOracle {
        &self.oracle
    }

    pub fn hierarchy(&self) -> &HierarchyResolver {
        &self.hierarchy
    }

    /// Maps an authenticated id to its live user.
    pub async fn resolve_actor(&self, user_id: Uuid) -> AppResult<Principal> {
        self.store
            .find_actor(user_id)
            .await?
            .map(Principal::from)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Runs existence, tenancy, permission and hierarchy checks in that
    /// order. Nothing is written; the first failing gate ends the pass.
    pub async fn authorize(&self, actor_id: Uuid, guard: Guard) -> AppResult<Authorized> {
        let actor = match self.resolve_actor(actor_id).await {
            Ok(actor) => actor,
            Err(err) if err.is_not_found() => return Err(deny(actor_id, &guard, GateState::Unauthenticated, err)),
            Err(err) => return Err(err),
        };

        let target = self.resolve_target(&actor, &guard).await?;

        let grants = self.oracle.grants(actor.user_id).await?;
        let org_wide = grants.has(guard.policy.org_permission);
        let permitted = org_wide
            || (guard.policy.owner_bypass && actor.owns(&target))
            || self.list_grant(&guard, &target, &grants).await?;
        if !permitted {
            return Err(deny(
                actor_id,
                &guard,
                GateState::PermissionDenied,
                AppError::forbidden(guard.policy.denial),
            ));
        }

        if guard.policy.hierarchy {
            match self.check_hierarchy(&actor, &guard, &target).await {
                Ok(()) => {}
                Err(err) if err.is_forbidden() => {
                    return Err(deny(actor_id, &guard, GateState::HierarchyViolation, err));
                }
                Err(err) => return Err(err),
            }
        }

        tracing::debug!(
            actor_id = %actor_id,
            state = ?GateState::Authorized,
            entity = guard.target.kind(),
            entity_id = ?guard.target.id(),
            "authorization granted"
        );

        Ok(Authorized { actor, target, org_wide })
    }

    async fn resolve_target(&self, actor: &Principal, guard: &Guard) -> AppResult<EntityScope> {
        if guard.target == Target::Organization {
            return Ok(EntityScope {
                org_id: actor.org_id,
                ..Default::default()
            });
        }

        let missing = || AppError::not_found(format!("{} not found", guard.target.kind()));
        match self.store.scope_of(guard.target).await? {
            Some(scope) if actor.same_tenant(&scope) => Ok(scope),
            // Indistinguishable from a missing entity.
            Some(_) => Err(deny(actor.user_id, guard, GateState::TenancyFailed, missing())),
            None => Err(missing()),
        }
    }

    async fn list_grant(&self, guard: &Guard, target: &EntityScope, grants: &Grants) -> AppResult<bool> {
        let Some(list_permission) = guard.policy.list_permission else {
            return Ok(false);
        };
        match guard.target {
            Target::User(user_id) => self.oracle.shares_list(grants, user_id, list_permission).await,
            _ => Ok(target
                .list_id
                .is_some_and(|list| grants.has_on_list(list, list_permission))),
        }
    }

    async fn check_hierarchy(&self, actor: &Principal, guard: &Guard, target: &EntityScope) -> AppResult<()> {
        let scope = match target.list_id {
            Some(list) => Scope::List(list),
            None => Scope::Organization(target.org_id),
        };

        if let Some(level) = target.level {
            self.hierarchy.ensure_below(actor.user_id, scope, level).await?;
        }

        for level in &guard.levels {
            self.hierarchy.ensure_below(actor.user_id, scope, *level).await?;
        }

        for role_id in &guard.roles {
            let role = self
                .store
                .find_role(*role_id)
                .await?
                .filter(|r| r.org_id == actor.org_id)
                .ok_or_else(|| AppError::not_found("role not found"))?;
            self.hierarchy
                .ensure_below(actor.user_id, Scope::of_role(&role), role.level)
                .await?;
        }

        self.hierarchy
            .ensure_possessed(actor.user_id, &guard.permissions)
            .await
    }
}

fn deny(actor_id: Uuid, guard: &Guard, state: GateState, err: AppError) -> AppError {
    let entity = guard.target.kind();
    let entity_id = guard.target.id();
    match state {
        GateState::TenancyFailed => {
            tracing::warn!(actor_id = %actor_id, state = ?state, entity, entity_id = ?entity_id, "authorization denied")
        }
        _ => tracing::debug!(actor_id = %actor_id, state = ?state, entity, entity_id = ?entity_id, "authorization denied"),
    }
    err
}
