use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::auth::{auth_middleware, AuthService};
use crate::shortener::MappingService;

use super::handlers::{analytics_overview, analytics_page, index, submit_form, WebState};

pub fn create_web_router(
    service: Arc<MappingService>,
    auth_service: Arc<AuthService>,
    deploy_url: String,
) -> Router {
    let state = Arc::new(WebState {
        service,
        auth: Arc::clone(&auth_service),
        deploy_url,
    });

    let protected_routes = Router::new()
        .route("/analytics/", get(analytics_overview))
        .route_layer(middleware::from_fn_with_state(auth_service, auth_middleware))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/analytics/{short_url}", get(analytics_page))
        .with_state(state)
        .merge(protected_routes)
}
