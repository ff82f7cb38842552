use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::auth::AuthService;
use crate::config::Config;
use crate::redirect::create_redirect_router;
use crate::shortener::MappingService;
use crate::storage::Storage;
use crate::web::create_web_router;

/// Assemble the full HTTP surface around an already initialized storage handle.
pub fn create_app(storage: Arc<dyn Storage>, config: &Config) -> Router {
    let service = Arc::new(MappingService::new(
        Arc::clone(&storage),
        config.short_codes.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(config.auth.mode, storage));

    let api_router = create_api_router(
        Arc::clone(&service),
        Arc::clone(&auth_service),
        config.deploy_url.clone(),
    );
    let web_router = create_web_router(
        Arc::clone(&service),
        auth_service,
        config.deploy_url.clone(),
    );
    let redirect_router = create_redirect_router(service, config.redirect_status);

    Router::new()
        .merge(api_router)
        .merge(web_router)
        .merge(redirect_router)
        .layer(TraceLayer::new_for_http())
}
