//! Authorization core.
//!
//! Every guarded operation runs through one gate, in a fixed order:
//! - existence of the acting user
//! - tenancy of the target (same organization as the actor)
//! - permission (org-wide, or bound to the target's list)
//! - hierarchy (levels strictly below the actor's authority, no granting
//!   of permissions the actor does not hold)

mod engine;
mod hierarchy;
mod memory;
mod oracle;
pub mod policy;
mod principal;
mod sqlite;
mod store;

pub use engine::{AuthorizationEngine, Authorized, GateState, Guard};
pub use hierarchy::{HierarchyResolver, Scope};
pub use memory::MemoryStore;
pub use oracle::{Grants, PermissionOracle};
pub use policy::Policy;
pub use principal::Principal;
pub use sqlite::SqliteAuthzStore;
pub use store::{ActorRecord, AuthzStore, EntityScope, RoleGrant, RoleRecord, Target};

/// Well-known permission names, seeded by migration.
pub mod permissions {
    // Role
    pub const CREATE_ROLE_ORGANIZATION: &str = "create_role_organization";
    pub const CREATE_ROLE_LIST: &str = "create_role_list";
    pub const UPDATE_ROLE_ORGANIZATION: &str = "update_role_organization";
    pub const UPDATE_ROLE_LIST: &str = "update_role_list";
    pub const DELETE_ROLE_ORGANIZATION: &str = "delete_role_organization";
    pub const DELETE_ROLE_LIST: &str = "delete_role_list";
    pub const VIEW_ALL_ROLE_ORGANIZATION: &str = "view_all_role_organization";
    pub const VIEW_ALL_ROLE_LIST: &str = "view_all_role_list";

    // User
    pub const CREATE_USER_FOR_ORGANIZATION: &str = "create_user_for_organization";
    pub const CREATE_USER_FOR_LIST: &str = "create_user_for_list";
    pub const VIEW_ALL_USER_ORGANIZATION: &str = "view_all_user_organization";
    pub const VIEW_ALL_USER_LIST: &str = "view_all_user_list";
    pub const UPDATE_USER_ORGANIZATION: &str = "update_user_organization";
    pub const UPDATE_USER_LIST: &str = "update_user_list";
    pub const DELETE_USER_ORGANIZATION: &str = "delete_user_organization";

    // List
    pub const CREATE_LIST: &str = "create_list";
    pub const UPDATE_LIST_ORGANIZATION: &str = "update_list_organization";
    pub const UPDATE_LIST_LIST: &str = "update_list_list";
    pub const VIEW_ALL_LISTS: &str = "view_all_lists";

    // Campaign
    pub const CREATE_CAMPAIGN_ORGANIZATION: &str = "create_campaign_organization";
    pub const CREATE_CAMPAIGN_LIST: &str = "create_campaign_list";
    pub const VIEW_ALL_CAMPAIGN_ORGANIZATION: &str = "view_all_campaign_organization";
    pub const VIEW_ALL_CAMPAIGN_LIST: &str = "view_all_campaign_list";
    pub const UPDATE_CAMPAIGN_ORGANIZATION: &str = "update_campaign_organization";
    pub const UPDATE_CAMPAIGN_LIST: &str = "update_campaign_list";
    pub const DELETE_CAMPAIGN_ORGANIZATION: &str = "delete_campaign_organization";
    pub const DELETE_CAMPAIGN_LIST: &str = "delete_campaign_list";
    pub const MANAGER_CANDIDATE_IN_CAMPAIGN_ORGANIZATION: &str = "manager_candidate_in_campaign_organization";
    pub const MANAGER_CANDIDATE_IN_CAMPAIGN_LIST: &str = "manager_candidate_in_campaign_list";

    // Candidate
    pub const CREATE_CANDIDATE_ORGANIZATION: &str = "create_candidate_organization";
    pub const CREATE_CANDIDATE_LIST: &str = "create_candidate_list";
    pub const VIEW_ALL_CANDIDATE_ORGANIZATION: &str = "view_all_candidate_organization";
    pub const VIEW_ALL_CANDIDATE_LIST: &str = "view_all_candidate_list";
    pub const CAN_BE_CANDIDATE: &str = "can_be_candidate";

    // File
    pub const ADD_FILE_ORGANIZATION: &str = "add_file_organization";
    pub const ADD_FILE_LIST: &str = "add_file_list";
    pub const DELETE_FILE_ORGANIZATION: &str = "delete_file_organization";
    pub const DELETE_FILE_LIST: &str = "delete_file_list";

    /// Every seeded permission, in seed order.
    pub const ALL: &[&str] = &[
        CREATE_ROLE_ORGANIZATION,
        CREATE_ROLE_LIST,
        UPDATE_ROLE_ORGANIZATION,
        UPDATE_ROLE_LIST,
        DELETE_ROLE_ORGANIZATION,
        DELETE_ROLE_LIST,
        VIEW_ALL_ROLE_ORGANIZATION,
        VIEW_ALL_ROLE_LIST,
        CREATE_USER_FOR_ORGANIZATION,
        CREATE_USER_FOR_LIST,
        VIEW_ALL_USER_ORGANIZATION,
        VIEW_ALL_USER_LIST,
        UPDATE_USER_ORGANIZATION,
        UPDATE_USER_LIST,
        DELETE_USER_ORGANIZATION,
        CREATE_LIST,
        UPDATE_LIST_ORGANIZATION,
        UPDATE_LIST_LIST,
        VIEW_ALL_LISTS,
        CREATE_CAMPAIGN_ORGANIZATION,
        CREATE_CAMPAIGN_LIST,
        VIEW_ALL_CAMPAIGN_ORGANIZATION,
        VIEW_ALL_CAMPAIGN_LIST,
        UPDATE_CAMPAIGN_ORGANIZATION,
        UPDATE_CAMPAIGN_LIST,
        DELETE_CAMPAIGN_ORGANIZATION,
        DELETE_CAMPAIGN_LIST,
        MANAGER_CANDIDATE_IN_CAMPAIGN_ORGANIZATION,
        MANAGER_CANDIDATE_IN_CAMPAIGN_LIST,
        CREATE_CANDIDATE_ORGANIZATION,
        CREATE_CANDIDATE_LIST,
        VIEW_ALL_CANDIDATE_ORGANIZATION,
        VIEW_ALL_CANDIDATE_LIST,
        CAN_BE_CANDIDATE,
        ADD_FILE_ORGANIZATION,
        ADD_FILE_LIST,
        DELETE_FILE_ORGANIZATION,
        DELETE_FILE_LIST,
    ];
}
