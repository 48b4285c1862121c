use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::role::Permission;

/// The acting user, as far as authorization is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    pub id: Uuid,
    pub org_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub id: Uuid,
    pub org_id: Uuid,
    pub list_id: Option<Uuid>,
    pub level: i64,
}

/// One permission reaching a user through one of its roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: RoleRecord,
    pub permission: Permission,
}

/// Entities a guarded operation can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The actor's own organization (creating lists, org-wide listings, ...).
    Organization,
    Role(Uuid),
    List(Uuid),
    Campaign(Uuid),
    Candidate(Uuid),
    File(Uuid),
    User(Uuid),
    Position(Uuid),
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Organization => "organization",
            Target::Role(_) => "role",
            Target::List(_) => "list",
            Target::Campaign(_) => "campaign",
            Target::Candidate(_) => "candidate",
            Target::File(_) => "file",
            Target::User(_) => "user",
            Target::Position(_) => "position",
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Target::Organization => None,
            Target::Role(id)
            | Target::List(id)
            | Target::Campaign(id)
            | Target::Candidate(id)
            | Target::File(id)
            | Target::User(id)
            | Target::Position(id) => Some(*id),
        }
    }
}

/// Where an entity lives: its organization, the list it is bound to (if any)
/// and the users that own it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityScope {
    pub org_id: Uuid,
    pub list_id: Option<Uuid>,
    /// Users that own the entity: the uploader of a file, the user itself,
    /// the candidates standing in a campaign.
    pub owners: Vec<Uuid>,
    /// Level of the entity when it is a role.
    pub level: Option<i64>,
}

/// Scoped lookups the authorization core needs from persistence.
///
/// Every method reads the current state; implementations must not cache.
#[async_trait]
pub trait AuthzStore: Send + Sync {
    /// Non-deleted user by id.
    async fn find_actor(&self, user_id: Uuid) -> AppResult<Option<ActorRecord>>;

    /// Roles held by a non-deleted user.
    async fn user_roles(&self, user_id: Uuid) -> AppResult<Vec<RoleRecord>>;

    /// Every (role, permission) pair reaching a non-deleted user.
    async fn user_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>>;

    /// Lists the user is a member of, independent of roles.
    async fn user_lists(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Every list of an organization.
    async fn org_lists(&self, org_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>>;

    /// Existing permissions among `ids`; unknown ids are simply absent.
    async fn find_permissions(&self, ids: &[Uuid]) -> AppResult<Vec<Permission>>;

    /// Resolves any non-organization target to its scope.
    async fn scope_of(&self, target: Target) -> AppResult<Option<EntityScope>>;
}
