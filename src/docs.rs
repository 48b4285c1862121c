use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::login,
		routes::auth::me,
		routes::auth::change_password,
		routes::organizations::current,
		routes::organizations::by_code,
		routes::roles::list_roles,
		routes::roles::catalog,
		routes::roles::my_roles,
		routes::roles::assignable_roles,
		routes::roles::create_role,
		routes::roles::get_role,
		routes::roles::update_role,
		routes::roles::delete_role,
		routes::roles::assign_role,
		routes::roles::revoke_role,
		routes::users::list_users,
		routes::users::create_user,
		routes::users::create_users,
		routes::users::get_user,
		routes::users::update_user,
		routes::users::update_users,
		routes::users::delete_user,
		routes::users::delete_users,
		routes::lists::list_lists,
		routes::lists::create_list,
		routes::lists::get_list,
		routes::lists::update_list,
		routes::campaigns::list_campaigns,
		routes::campaigns::create_campaign,
		routes::campaigns::get_campaign,
		routes::campaigns::update_campaign,
		routes::campaigns::delete_campaign,
		routes::campaigns::list_campaign_candidates,
		routes::campaigns::add_campaign_candidate,
		routes::campaigns::remove_campaign_candidate,
		routes::positions::list_positions,
		routes::positions::create_position,
		routes::positions::delete_position,
		routes::candidates::create_candidate,
		routes::candidates::get_candidate,
		routes::candidates::list_candidates,
		routes::files::register_file,
		routes::files::get_file,
		routes::files::delete_file
	),
	components(
		schemas(
			routes::health::HealthResponse,
			models::user::User,
			models::user::UserDetail,
			models::user::UserCreateRequest,
			models::user::UserUpdateRequest,
			models::user::UserUpdateResponse,
			models::user::UserBatchDeleteRequest,
			models::user::LoginRequest,
			models::user::AuthResponse,
			models::user::ChangePasswordRequest,
			models::organization::Organization,
			models::organization::OrganizationStatus,
			models::role::Role,
			models::role::Permission,
			models::role::RoleCatalog,
			models::role::RoleCreateRequest,
			models::role::RoleUpdateRequest,
			models::role::AssignRoleRequest,
			models::list::List,
			models::list::ListCreateRequest,
			models::list::ListUpdateRequest,
			models::campaign::Campaign,
			models::campaign::CampaignCreateRequest,
			models::campaign::CampaignUpdateRequest,
			models::campaign::CampaignCandidateRequest,
			models::campaign::BallotEntry,
			models::position::Position,
			models::position::PositionCreateRequest,
			models::candidate::Candidate,
			models::candidate::CandidateCreateRequest,
			models::file::StoredFile,
			models::file::FileRegisterRequest
		)
	),
	modifiers(&BearerAuth),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Auth", description = "Login and the caller's own account"),
		(name = "Organizations", description = "Tenants"),
		(name = "Roles", description = "Roles, levels and permission sets"),
		(name = "Users", description = "Users, list membership and role assignment"),
		(name = "Lists", description = "Ballot lists"),
		(name = "Campaigns", description = "Election campaigns"),
		(name = "Candidates", description = "Candidates standing for a list"),
		(name = "Files", description = "Uploaded file metadata")
	)
)]
pub struct ApiDoc;

/// Registers the `bearerAuth` scheme referenced by guarded operations.
struct BearerAuth;

impl Modify for BearerAuth {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		let components = openapi.components.get_or_insert_with(Default::default);
		components.add_security_scheme(
			"bearerAuth",
			SecurityScheme::Http(
				HttpBuilder::new()
					.scheme(HttpAuthScheme::Bearer)
					.bearer_format("JWT")
					.build(),
			),
		);
	}
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}
