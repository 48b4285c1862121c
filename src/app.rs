use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AuthorizationEngine, SqliteAuthzStore};
use crate::config::max_upload_bytes_from_env;
use crate::docs;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, campaigns, candidates, files, health, lists, organizations, positions, roles, users};
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, max_upload_bytes: i64) -> Self {
        let engine = AuthorizationEngine::new(Arc::new(SqliteAuthzStore::new(pool.clone())));
        let services = Services::new(pool.clone(), engine, max_upload_bytes);
        Self {
            pool,
            jwt: Arc::new(jwt),
            services: Arc::new(services),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config, max_upload_bytes_from_env()?);
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password));

    let organization_routes = Router::new()
        .route("/current", get(organizations::current))
        .route("/code/:code", get(organizations::by_code));

    let role_routes = Router::new()
        .route("/", get(roles::list_roles).post(roles::create_role))
        .route("/catalog", get(roles::catalog))
        .route("/mine", get(roles::my_roles))
        .route("/assignable", get(roles::assignable_roles))
        .route("/:id", get(roles::get_role).put(roles::update_role).delete(roles::delete_role));

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/batch",
            post(users::create_users).put(users::update_users).delete(users::delete_users),
        )
        .route("/:id", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/:id/roles", post(roles::assign_role))
        .route("/:id/roles/:role_id", delete(roles::revoke_role));

    let list_routes = Router::new()
        .route("/", get(lists::list_lists).post(lists::create_list))
        .route("/:id", get(lists::get_list).put(lists::update_list))
        .route("/:id/candidates", get(candidates::list_candidates));

    let campaign_routes = Router::new()
        .route("/", get(campaigns::list_campaigns).post(campaigns::create_campaign))
        .route(
            "/:id",
            get(campaigns::get_campaign)
                .put(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route(
            "/:id/candidates",
            get(campaigns::list_campaign_candidates).post(campaigns::add_campaign_candidate),
        )
        .route("/:id/candidates/:candidate_id", delete(campaigns::remove_campaign_candidate));

    let position_routes = Router::new()
        .route("/", get(positions::list_positions).post(positions::create_position))
        .route("/:id", delete(positions::delete_position));

    let candidate_routes = Router::new()
        .route("/", post(candidates::create_candidate))
        .route("/:id", get(candidates::get_candidate));

    let file_routes = Router::new()
        .route("/", post(files::register_file))
        .route("/:id", get(files::get_file).delete(files::delete_file));

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes)
        .nest("/roles", role_routes)
        .nest("/users", user_routes)
        .nest("/lists", list_routes)
        .nest("/campaigns", campaign_routes)
        .nest("/positions", position_routes)
        .nest("/candidates", candidate_routes)
        .nest("/files", file_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
