use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AccessConfig, AccessEngine, Provider};
use crate::db::{SqliteIdentityRepository, SqliteMembershipRepository};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{access, health, suggestions};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub provider: Provider,
    pub engine: AccessEngine,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, config: AccessConfig) -> Self {
        let provider = Provider::new(
            Arc::new(SqliteIdentityRepository::new(pool.clone())),
            Arc::new(SqliteMembershipRepository::new(pool.clone())),
        );

        Self {
            pool,
            jwt: Arc::new(jwt),
            provider,
            engine: AccessEngine::with_capability(config.override_capability),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let access_config = AccessConfig::from_env()?;
    Ok(router(AppState::new(pool, jwt_config, access_config)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let company_routes = Router::new()
        .route("/:company_id/access", get(access::inspect_access))
        .route("/:company_id/access/:level", post(access::require_access));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/companies", company_routes)
        .route("/suggestions/:kind", get(suggestions::suggestions))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
