use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::RedirectMode;
use crate::error::ApiError;
use crate::shortener::MappingService;

pub struct RedirectState {
    pub service: Arc<MappingService>,
    pub redirect_status: RedirectMode,
}

/// Redirect a visitor to the source URL, counting the view
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    code: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(code) = code?;
    let source_url = state.service.redirect(&code).await?;

    let location = HeaderValue::from_str(&source_url).map_err(|e| {
        anyhow::anyhow!("stored URL for '{code}' is not a valid Location header: {e}")
    })?;

    Ok((
        state.redirect_status.status_code(),
        [(header::LOCATION, location)],
    )
        .into_response())
}
