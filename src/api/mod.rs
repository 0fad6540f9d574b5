// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod pagination;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{PermissionService, ReferenceService, ReportService, UserService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<UserService>,
    pub reports: Arc<ReportService>,
    pub permissions: Arc<PermissionService>,
    pub reference: Arc<ReferenceService>,
}

/// Builds the full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::auth::health_check))
        // Auth routes
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // User routes
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/users/:id", get(handlers::users::get_user))
        .route("/api/users/:id", put(handlers::users::update_user))
        .route("/api/users/:id", delete(handlers::users::delete_user))
        // Two-factor routes
        .route("/api/2fa/setup", post(handlers::two_factor::setup))
        .route("/api/2fa/enable", post(handlers::two_factor::enable))
        .route("/api/2fa/verify", post(handlers::two_factor::verify))
        .route("/api/2fa/disable", post(handlers::two_factor::disable))
        // Report routes
        .route("/api/reports", post(handlers::reports::request_report))
        .route("/api/reports/:id", get(handlers::reports::get_report))
        // Reference data routes
        .route("/api/countries", get(handlers::reference::list_countries))
        .route("/api/languages", get(handlers::reference::list_languages))
        .route("/api/units", get(handlers::reference::list_units))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
