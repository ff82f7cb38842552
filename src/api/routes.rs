use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::{auth_middleware, AuthService};
use crate::shortener::MappingService;

use super::handlers::{
    create_url, create_user, delete_url, get_analytics, get_overview, health_check, issue_key,
    AppState,
};

pub fn create_api_router(
    service: Arc<MappingService>,
    auth_service: Arc<AuthService>,
    deploy_url: String,
) -> Router {
    let state = Arc::new(AppState {
        service,
        auth: Arc::clone(&auth_service),
        deploy_url,
    });

    let protected_routes = Router::new()
        .route("/api/create", post(create_url))
        .route("/api/delete", delete(delete_url))
        .route("/api/user/create", post(create_user))
        .route("/api/analytics", get(get_overview))
        .route_layer(middleware::from_fn_with_state(auth_service, auth_middleware))
        .with_state(Arc::clone(&state));

    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analytics/{short_url}", get(get_analytics))
        .route("/api/key/create", post(issue_key))
        .with_state(state);

    public_routes.merge(protected_routes)
}
