use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::RedirectMode;
use crate::shortener::MappingService;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(service: Arc<MappingService>, redirect_status: RedirectMode) -> Router {
    let state = Arc::new(RedirectState {
        service,
        redirect_status,
    });

    Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
