use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{RevocationSet, TokenIssuer};
use crate::config::{Config, SecurityConfig};
use crate::db::Store;

pub mod admin;
pub mod auth;
mod error;
pub mod monitor;
pub mod reporter;
mod system;
pub mod types;
pub mod validation;

pub use error::ApiError;

#[cfg(test)]
mod tests;

pub struct AppState {
    store: Store,
    tokens: TokenIssuer,
    revoked: RevocationSet,
    config: Config,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> anyhow::Result<Arc<Self>> {
        let tokens = TokenIssuer::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        )?;

        Ok(Arc::new(Self {
            store,
            tokens,
            revoked: RevocationSet::new(),
            config,
        }))
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn revoked(&self) -> &RevocationSet {
        &self.revoked
    }

    #[must_use]
    pub fn security(&self) -> &SecurityConfig {
        &self.config.security
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let logout = Router::new()
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_authenticated,
        ));

    let auth_router = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(logout);

    let admin_router = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/facilities",
            get(admin::list_facilities).post(admin::create_facility),
        )
        .route("/facilities/{facility_id}", delete(admin::delete_facility))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let reporter_router = Router::new()
        .route("/reports", post(reporter::submit_report))
        .route("/reports/me", get(reporter::my_latest_report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_reporter,
        ));

    let monitor_router = Router::new()
        .route("/dashboard", get(monitor::dashboard_summary))
        .route("/dashboard/history", get(monitor::dashboard_history))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_monitor,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::index))
        .route("/health", get(system::health))
        .nest("/api/auth", auth_router)
        .nest("/api/admin", admin_router)
        .nest("/api/reporter", reporter_router)
        .nest("/api/monitor", monitor_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
