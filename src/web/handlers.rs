use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::pages::{self, Flash};
use crate::auth::AuthService;
use crate::error::ApiError;
use crate::shortener::service::MAX_LIST_LIMIT;
use crate::shortener::{CreateMapping, MappingService};

pub struct WebState {
    pub service: Arc<MappingService>,
    pub auth: Arc<AuthService>,
    pub deploy_url: String,
}

#[derive(Debug, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShortenForm {
    pub url: Option<String>,
    pub short: Option<String>,
    pub expiry: Option<String>,
    pub api_key: Option<String>,
}

fn flash_redirect(kind: &str, message: &str) -> Response {
    Redirect::to(&format!("/?{kind}={}", urlencoding::encode(message))).into_response()
}

pub async fn index(
    State(state): State<Arc<WebState>>,
    Query(query): Query<FlashQuery>,
) -> Html<String> {
    let flash = match (query.success, query.error) {
        (_, Some(error)) => Some(Flash::Error(error)),
        (Some(success), None) => Some(Flash::Success(success)),
        (None, None) => None,
    };
    Html(pages::index_page(flash, state.auth.is_enabled()))
}

/// Form submission: create, then redirect back to the index with a flash message
pub async fn submit_form(
    State(state): State<Arc<WebState>>,
    form: Result<Form<ShortenForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    state.auth.require(form.api_key.as_deref()).await?;

    let request = CreateMapping {
        source_url: form.url.unwrap_or_default(),
        short_code: form.short,
        expiry: form.expiry,
    };

    match state.service.create(request).await {
        Ok(created) => {
            let link = format!("{}{}", state.deploy_url, created.short_code);
            info!(short_code = %created.short_code, "created mapping from form");
            Ok(flash_redirect("success", &link))
        }
        Err(err @ (ApiError::Conflict(_) | ApiError::InvalidInput(_))) => {
            Ok(flash_redirect("error", &err.to_string()))
        }
        Err(err) => Err(err),
    }
}

pub async fn analytics_overview(State(state): State<Arc<WebState>>) -> Result<Html<String>, ApiError> {
    let overview = state.service.overview(Some((MAX_LIST_LIMIT, 0))).await?;
    Ok(Html(pages::overview_page(&overview, &state.deploy_url)))
}

pub async fn analytics_page(
    State(state): State<Arc<WebState>>,
    short_code: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(short_code) = short_code?;
    match state.service.analytics(&short_code).await {
        Ok(mapping) => Ok(Html(pages::mapping_page(&mapping, &state.deploy_url)).into_response()),
        Err(ApiError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            Html(pages::not_found_page(&short_code)),
        )
            .into_response()),
        Err(err) => Err(err),
    }
}
