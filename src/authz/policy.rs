//! Policy descriptors for every guarded operation.

use super::permissions as p;

/// What the gate demands for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Satisfies the permission gate when held through any role.
    pub org_permission: &'static str,
    /// Satisfies the permission gate when held through a role bound to the
    /// target's list (or, for user targets, to a list the target belongs to).
    pub list_permission: Option<&'static str>,
    /// Run the hierarchy gate after the permission gate.
    pub hierarchy: bool,
    /// Owners of the target (the user itself, a file's uploader, the
    /// candidates of a campaign) pass the permission gate.
    pub owner_bypass: bool,
    /// Message of the Forbidden raised by the permission gate.
    pub denial: &'static str,
}

impl Policy {
    const fn new(org_permission: &'static str, list_permission: Option<&'static str>, denial: &'static str) -> Self {
        Self {
            org_permission,
            list_permission,
            hierarchy: false,
            owner_bypass: false,
            denial,
        }
    }

    const fn with_hierarchy(mut self) -> Self {
        self.hierarchy = true;
        self
    }

    const fn with_owner_bypass(mut self) -> Self {
        self.owner_bypass = true;
        self
    }
}

// Roles
pub const CREATE_ROLE: Policy = Policy::new(
    p::CREATE_ROLE_ORGANIZATION,
    Some(p::CREATE_ROLE_LIST),
    "you do not have permission to create roles here",
)
.with_hierarchy();
pub const UPDATE_ROLE: Policy = Policy::new(
    p::UPDATE_ROLE_ORGANIZATION,
    Some(p::UPDATE_ROLE_LIST),
    "you do not have permission to update this role",
)
.with_hierarchy();
pub const DELETE_ROLE: Policy = Policy::new(
    p::DELETE_ROLE_ORGANIZATION,
    Some(p::DELETE_ROLE_LIST),
    "you do not have permission to delete this role",
)
.with_hierarchy();
pub const VIEW_ROLES: Policy = Policy::new(
    p::VIEW_ALL_ROLE_ORGANIZATION,
    Some(p::VIEW_ALL_ROLE_LIST),
    "you do not have permission to view these roles",
);

// Users
pub const CREATE_USER: Policy = Policy::new(
    p::CREATE_USER_FOR_ORGANIZATION,
    Some(p::CREATE_USER_FOR_LIST),
    "you do not have permission to create users here",
)
.with_hierarchy();
pub const VIEW_USER: Policy = Policy::new(
    p::VIEW_ALL_USER_ORGANIZATION,
    Some(p::VIEW_ALL_USER_LIST),
    "you do not have permission to view this user",
)
.with_owner_bypass();
pub const VIEW_USERS: Policy = Policy::new(
    p::VIEW_ALL_USER_ORGANIZATION,
    Some(p::VIEW_ALL_USER_LIST),
    "you do not have permission to view users",
);
pub const UPDATE_USER: Policy = Policy::new(
    p::UPDATE_USER_ORGANIZATION,
    Some(p::UPDATE_USER_LIST),
    "you do not have permission to update this user",
)
.with_owner_bypass();
/// Password resets, list membership changes and any change to another
/// user; owners do not pass, and the target's roles must sit below the actor.
pub const MANAGE_USER: Policy = Policy::new(
    p::UPDATE_USER_ORGANIZATION,
    Some(p::UPDATE_USER_LIST),
    "you do not have permission to manage this user",
)
.with_hierarchy();
pub const DELETE_USER: Policy = Policy::new(
    p::DELETE_USER_ORGANIZATION,
    None,
    "you do not have permission to delete users",
)
.with_hierarchy();
pub const ASSIGN_ROLE: Policy = Policy::new(
    p::UPDATE_USER_ORGANIZATION,
    Some(p::UPDATE_USER_LIST),
    "you do not have permission to assign roles to this user",
)
.with_hierarchy();

// Lists
pub const CREATE_LIST: Policy = Policy::new(p::CREATE_LIST, None, "you do not have permission to create lists");
pub const UPDATE_LIST: Policy = Policy::new(
    p::UPDATE_LIST_ORGANIZATION,
    Some(p::UPDATE_LIST_LIST),
    "you do not have permission to update this list",
);

// Campaigns
pub const CREATE_CAMPAIGN: Policy = Policy::new(
    p::CREATE_CAMPAIGN_ORGANIZATION,
    Some(p::CREATE_CAMPAIGN_LIST),
    "you do not have permission to create campaigns on this list",
);
pub const VIEW_CAMPAIGN: Policy = Policy::new(
    p::VIEW_ALL_CAMPAIGN_ORGANIZATION,
    Some(p::VIEW_ALL_CAMPAIGN_LIST),
    "you do not have permission to view this campaign",
)
.with_owner_bypass();
pub const VIEW_CAMPAIGNS: Policy = Policy::new(
    p::VIEW_ALL_CAMPAIGN_ORGANIZATION,
    Some(p::VIEW_ALL_CAMPAIGN_LIST),
    "you do not have permission to view campaigns on this list",
);
pub const UPDATE_CAMPAIGN: Policy = Policy::new(
    p::UPDATE_CAMPAIGN_ORGANIZATION,
    Some(p::UPDATE_CAMPAIGN_LIST),
    "you do not have permission to update this campaign",
);
pub const DELETE_CAMPAIGN: Policy = Policy::new(
    p::DELETE_CAMPAIGN_ORGANIZATION,
    Some(p::DELETE_CAMPAIGN_LIST),
    "you do not have permission to delete this campaign",
);
pub const MANAGE_CAMPAIGN_CANDIDATES: Policy = Policy::new(
    p::MANAGER_CANDIDATE_IN_CAMPAIGN_ORGANIZATION,
    Some(p::MANAGER_CANDIDATE_IN_CAMPAIGN_LIST),
    "you do not have permission to manage candidates in this campaign",
);

// Positions
pub const MANAGE_POSITIONS: Policy = Policy::new(
    p::MANAGER_CANDIDATE_IN_CAMPAIGN_ORGANIZATION,
    Some(p::MANAGER_CANDIDATE_IN_CAMPAIGN_LIST),
    "you do not have permission to manage positions here",
);
pub const VIEW_POSITIONS: Policy = Policy::new(
    p::VIEW_ALL_CAMPAIGN_ORGANIZATION,
    Some(p::VIEW_ALL_CAMPAIGN_LIST),
    "you do not have permission to view positions here",
);

// Candidates
pub const CREATE_CANDIDATE: Policy = Policy::new(
    p::CREATE_CANDIDATE_ORGANIZATION,
    Some(p::CREATE_CANDIDATE_LIST),
    "you do not have permission to create candidates on this list",
);
pub const VIEW_CANDIDATES: Policy = Policy::new(
    p::VIEW_ALL_CANDIDATE_ORGANIZATION,
    Some(p::VIEW_ALL_CANDIDATE_LIST),
    "you do not have permission to view candidates on this list",
);
pub const VIEW_CANDIDATE: Policy = Policy::new(
    p::VIEW_ALL_CANDIDATE_ORGANIZATION,
    Some(p::VIEW_ALL_CANDIDATE_LIST),
    "you do not have permission to view this candidate",
)
.with_owner_bypass();

// Files
pub const ADD_FILE: Policy = Policy::new(
    p::ADD_FILE_ORGANIZATION,
    Some(p::ADD_FILE_LIST),
    "you do not have permission to upload files here",
);
pub const DELETE_FILE: Policy = Policy::new(
    p::DELETE_FILE_ORGANIZATION,
    Some(p::DELETE_FILE_LIST),
    "you do not have permission to delete this file",
)
.with_owner_bypass();
