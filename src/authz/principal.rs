use uuid::Uuid;

use super::store::{ActorRecord, EntityScope};

/// The resolved acting user of a guarded operation.
///
/// Carries identity only; roles and permissions are always read from the
/// store at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub org_id: Uuid,
}

impl Principal {
    pub fn new(user_id: Uuid, org_id: Uuid) -> Self {
        Self { user_id, org_id }
    }

    pub fn same_tenant(&self, scope: &EntityScope) -> bool {
        self.org_id == scope.org_id
    }

    pub fn owns(&self, scope: &EntityScope) -> bool {
        scope.owners.contains(&self.user_id)
    }
}

impl From<ActorRecord> for Principal {
    fn from(actor: ActorRecord) -> Self {
        Self::new(actor.id, actor.org_id)
    }
}
