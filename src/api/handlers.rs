use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{
    CreateUrlRequest, CreateUserRequest, DeleteUrlRequest, IssueKeyRequest, MappingAnalytics,
    Overview,
};
use crate::shortener::service::DEFAULT_LIST_LIMIT;
use crate::shortener::{CreateMapping, MappingService};

pub struct AppState {
    pub service: Arc<MappingService>,
    pub auth: Arc<AuthService>,
    pub deploy_url: String,
}

#[derive(Serialize)]
pub struct CreateUrlResponse {
    pub result: &'static str,
    pub url: String,
    pub short_url: String,
}

#[derive(Serialize)]
pub struct DeleteUrlResponse {
    pub deleted: &'static str,
}

#[derive(Serialize)]
pub struct CreateUserResponse {
    pub status: &'static str,
    pub username: String,
}

#[derive(Serialize)]
pub struct IssueKeyResponse {
    pub key: String,
    pub label: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub include_urls: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ApiError::InvalidInput(format!(
            "body parameter '{name}' is required, please supply one and try again"
        ))
    })
}

/// Create a new short URL
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<Json<CreateUrlResponse>, ApiError> {
    let Json(payload) = payload?;
    let source_url = required(payload.url, "url")?;

    let created = state
        .service
        .create(CreateMapping {
            source_url,
            short_code: payload.shorturl,
            expiry: payload.expiry,
        })
        .await?;

    Ok(Json(CreateUrlResponse {
        result: "success",
        url: format!("{}{}", state.deploy_url, created.short_code),
        short_url: created.short_code,
    }))
}

/// Hard delete a short URL
pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteUrlRequest>, JsonRejection>,
) -> Result<Json<DeleteUrlResponse>, ApiError> {
    let Json(payload) = payload?;
    let short_code = required(payload.shorturl, "shorturl")?;

    state.service.delete(&short_code).await?;
    Ok(Json(DeleteUrlResponse { deleted: "success" }))
}

/// Public analytics for a single short URL
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    short_code: Result<Path<String>, PathRejection>,
) -> Result<Json<MappingAnalytics>, ApiError> {
    let Path(short_code) = short_code?;
    let mapping = state.service.analytics(&short_code).await?;
    Ok(Json(mapping.analytics()))
}

/// Aggregate counters for the whole system
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OverviewQuery>, QueryRejection>,
) -> Result<Json<Overview>, ApiError> {
    let Query(query) = query?;
    let page = query.include_urls.then_some((query.limit, query.offset));
    Ok(Json(state.service.overview(page).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let Json(payload) = payload?;
    let username = required(payload.username, "username")?;
    let password = required(payload.password, "password")?;

    state.auth.create_user(&username, &password).await?;
    Ok(Json(CreateUserResponse {
        status: "created",
        username: username.trim().to_string(),
    }))
}

/// Exchange user credentials for a new API key
pub async fn issue_key(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IssueKeyRequest>, JsonRejection>,
) -> Result<Json<IssueKeyResponse>, ApiError> {
    let Json(payload) = payload?;
    let username = required(payload.username, "username")?;
    let password = required(payload.password, "password")?;
    let label = payload.label.filter(|l| !l.trim().is_empty());

    let issued = state
        .auth
        .issue_key_for_user(&username, &password, label.as_deref())
        .await?;

    Ok(Json(IssueKeyResponse {
        key: issued.key,
        label: issued.record.label,
    }))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}
