use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::store::{ActorRecord, AuthzStore, EntityScope, RoleGrant, RoleRecord, Target};
use crate::errors::AppResult;
use crate::models::role::Permission;

#[derive(Debug)]
struct MemUser {
    org_id: Uuid,
    deleted: bool,
    roles: HashSet<Uuid>,
    lists: HashSet<Uuid>,
}

#[derive(Debug)]
struct MemRole {
    record: RoleRecord,
    permissions: HashSet<Uuid>,
}

#[derive(Debug, Default)]
struct Arena {
    organizations: HashSet<Uuid>,
    /// list -> organization
    lists: HashMap<Uuid, Uuid>,
    permissions: HashMap<Uuid, Permission>,
    roles: HashMap<Uuid, MemRole>,
    users: HashMap<Uuid, MemUser>,
    /// campaign -> list
    campaigns: HashMap<Uuid, Uuid>,
    /// campaign -> candidates attached to it
    campaign_candidates: HashMap<Uuid, HashSet<Uuid>>,
    /// candidate -> (list, user)
    candidates: HashMap<Uuid, (Uuid, Uuid)>,
    /// file -> (organization, list, uploader)
    files: HashMap<Uuid, (Uuid, Option<Uuid>, Uuid)>,
    /// position -> (organization, list)
    positions: HashMap<Uuid, (Uuid, Option<Uuid>)>,
}

impl Arena {
    fn live_user(&self, user_id: Uuid) -> Option<&MemUser> {
        self.users.get(&user_id).filter(|u| !u.deleted)
    }

    fn roles_of(&self, user_id: Uuid) -> impl Iterator<Item = &MemRole> {
        self.live_user(user_id)
            .into_iter()
            .flat_map(|u| u.roles.iter())
            .filter_map(|id| self.roles.get(id))
    }
}

/// Id-keyed arena implementing [`AuthzStore`].
///
/// Relations are plain id sets; nothing holds references into other
/// entities, so removing a role only touches the sets that mention it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_organization(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.write().organizations.insert(id);
        id
    }

    pub fn add_list(&self, org_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.write().lists.insert(id, org_id);
        id
    }

    /// Registers a permission by name, returning the existing id when the
    /// name is already known.
    pub fn add_permission(&self, name: &str) -> Uuid {
        let mut arena = self.write();
        if let Some(existing) = arena.permissions.values().find(|p| p.name == name) {
            return existing.id;
        }
        let id = Uuid::new_v4();
        arena.permissions.insert(
            id,
            Permission {
                id,
                name: name.to_string(),
                description: None,
            },
        );
        id
    }

    pub fn add_role(&self, org_id: Uuid, list_id: Option<Uuid>, level: i64, permissions: &[Uuid]) -> Uuid {
        let id = Uuid::new_v4();
        self.write().roles.insert(
            id,
            MemRole {
                record: RoleRecord { id, org_id, list_id, level },
                permissions: permissions.iter().copied().collect(),
            },
        );
        id
    }

    pub fn set_role_permissions(&self, role_id: Uuid, permissions: &[Uuid]) {
        if let Some(role) = self.write().roles.get_mut(&role_id) {
            role.permissions = permissions.iter().copied().collect();
        }
    }

    /// Drops a role together with every membership that references it.
    pub fn remove_role(&self, role_id: Uuid) {
        let mut arena = self.write();
        arena.roles.remove(&role_id);
        for user in arena.users.values_mut() {
            user.roles.remove(&role_id);
        }
    }

    pub fn add_user(&self, org_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.write().users.insert(
            id,
            MemUser {
                org_id,
                deleted: false,
                roles: HashSet::new(),
                lists: HashSet::new(),
            },
        );
        id
    }

    pub fn grant_role(&self, user_id: Uuid, role_id: Uuid) {
        if let Some(user) = self.write().users.get_mut(&user_id) {
            user.roles.insert(role_id);
        }
    }

    pub fn revoke_role(&self, user_id: Uuid, role_id: Uuid) {
        if let Some(user) = self.write().users.get_mut(&user_id) {
            user.roles.remove(&role_id);
        }
    }

    pub fn join_list(&self, user_id: Uuid, list_id: Uuid) {
        if let Some(user) = self.write().users.get_mut(&user_id) {
            user.lists.insert(list_id);
        }
    }

    pub fn soft_delete_user(&self, user_id: Uuid) {
        if let Some(user) = self.write().users.get_mut(&user_id) {
            user.deleted = true;
        }
    }

    pub fn add_campaign(&self, list_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.write().campaigns.insert(id, list_id);
        id
    }

    pub fn add_candidate(&self, list_id: Uuid, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.write().candidates.insert(id, (list_id, user_id));
        id
    }

    pub fn attach_candidate(&self, campaign_id: Uuid, candidate_id: Uuid) {
        self.write()
            .campaign_candidates
            .entry(campaign_id)
            .or_default()
            .insert(candidate_id);
    }

    pub fn add_file(&self, org_id: Uuid, list_id: Option<Uuid>, uploader: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.write().files.insert(id, (org_id, list_id, uploader));
        id
    }

    pub fn add_position(&self, org_id: Uuid, list_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.write().positions.insert(id, (org_id, list_id));
        id
    }
}

#[async_trait]
impl AuthzStore for MemoryStore {
    async fn find_actor(&self, user_id: Uuid) -> AppResult<Option<ActorRecord>> {
        let arena = self.read();
        Ok(arena.live_user(user_id).map(|u| ActorRecord {
            id: user_id,
            org_id: u.org_id,
        }))
    }

    async fn user_roles(&self, user_id: Uuid) -> AppResult<Vec<RoleRecord>> {
        let arena = self.read();
        Ok(arena.roles_of(user_id).map(|r| r.record.clone()).collect())
    }

    async fn user_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>> {
        let guard = self.read();
        let arena: &Arena = &guard;
        let grants = arena
            .roles_of(user_id)
            .flat_map(|role| {
                role.permissions
                    .iter()
                    .filter_map(move |pid| arena.permissions.get(pid))
                    .map(move |permission| RoleGrant {
                        role: role.record.clone(),
                        permission: permission.clone(),
                    })
            })
            .collect();
        Ok(grants)
    }

    async fn user_lists(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let arena = self.read();
        Ok(arena
            .users
            .get(&user_id)
            .map(|u| u.lists.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn org_lists(&self, org_id: Uuid) -> AppResult<Vec<Uuid>> {
        let arena = self.read();
        Ok(arena
            .lists
            .iter()
            .filter(|(_, org)| **org == org_id)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        Ok(self.read().roles.get(&role_id).map(|r| r.record.clone()))
    }

    async fn find_permissions(&self, ids: &[Uuid]) -> AppResult<Vec<Permission>> {
        let arena = self.read();
        let unique: HashSet<&Uuid> = ids.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| arena.permissions.get(id).cloned())
            .collect())
    }

    async fn scope_of(&self, target: Target) -> AppResult<Option<EntityScope>> {
        let arena = self.read();
        let scope = match target {
            Target::Organization => None,
            Target::Role(id) => arena.roles.get(&id).map(|r| EntityScope {
                org_id: r.record.org_id,
                list_id: r.record.list_id,
                owners: Vec::new(),
                level: Some(r.record.level),
            }),
            Target::List(id) => arena.lists.get(&id).map(|org| EntityScope {
                org_id: *org,
                list_id: Some(id),
                ..Default::default()
            }),
            Target::Campaign(id) => arena.campaigns.get(&id).and_then(|list| {
                let org = arena.lists.get(list)?;
                let owners = arena
                    .campaign_candidates
                    .get(&id)
                    .into_iter()
                    .flatten()
                    .filter_map(|cid| arena.candidates.get(cid).map(|(_, user)| *user))
                    .collect();
                Some(EntityScope {
                    org_id: *org,
                    list_id: Some(*list),
                    owners,
                    level: None,
                })
            }),
            Target::Candidate(id) => arena.candidates.get(&id).and_then(|(list, user)| {
                let org = arena.lists.get(list)?;
                Some(EntityScope {
                    org_id: *org,
                    list_id: Some(*list),
                    owners: vec![*user],
                    level: None,
                })
            }),
            Target::File(id) => arena.files.get(&id).map(|(org, list, uploader)| EntityScope {
                org_id: *org,
                list_id: *list,
                owners: vec![*uploader],
                level: None,
            }),
            Target::User(id) => arena.live_user(id).map(|u| EntityScope {
                org_id: u.org_id,
                list_id: None,
                owners: vec![id],
                level: None,
            }),
            Target::Position(id) => arena.positions.get(&id).map(|(org, list)| EntityScope {
                org_id: *org,
                list_id: *list,
                ..Default::default()
            }),
        };
        Ok(scope)
    }
}
