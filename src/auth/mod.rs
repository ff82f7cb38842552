pub mod keys;
pub mod password;

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AuthMode;
use crate::error::ApiError;
use crate::models::ApiKeyRecord;
use crate::storage::{Storage, StorageError};

pub use keys::{generate_api_key, hash_api_key};
use password::{hash_password, verify_password};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// A freshly issued API key, shown to the caller exactly once.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub key: String,
    pub record: ApiKeyRecord,
}

/// Gate for privileged operations, backed by the `api_keys` and `users` tables.
pub struct AuthService {
    mode: AuthMode,
    storage: Arc<dyn Storage>,
}

impl AuthService {
    pub fn new(mode: AuthMode, storage: Arc<dyn Storage>) -> Self {
        Self { mode, storage }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != AuthMode::None
    }

    /// Decide whether a request credential grants privileged access.
    pub async fn authorize(&self, credential: Option<&str>) -> anyhow::Result<bool> {
        if !self.is_enabled() {
            return Ok(true);
        }

        match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(key) => self.storage.api_key_exists(&hash_api_key(key)).await,
            None => Ok(false),
        }
    }

    /// Like `authorize`, but as a `Result` ready for handlers.
    pub async fn require(&self, credential: Option<&str>) -> Result<(), ApiError> {
        if self.authorize(credential).await? {
            Ok(())
        } else {
            warn!("rejected request without a valid API key");
            Err(ApiError::Unauthorized)
        }
    }

    pub async fn issue_key(&self, label: Option<&str>) -> Result<IssuedKey, ApiError> {
        let key = generate_api_key();
        let record = self
            .storage
            .create_api_key(&hash_api_key(&key), label)
            .await?;
        info!(key_id = record.id, "issued API key");
        Ok(IssuedKey { key, record })
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput(
                "body parameters 'username' and 'password' are required".to_string(),
            ));
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(anyhow::Error::from)?;

        match self.storage.create_user(username, &hash).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "created user");
                Ok(())
            }
            Err(StorageError::Conflict) => Err(ApiError::Conflict(
                "that username already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Exchange a username and password for a new API key.
    pub async fn issue_key_for_user(
        &self,
        username: &str,
        password: &str,
        label: Option<&str>,
    ) -> Result<IssuedKey, ApiError> {
        let Some(user) = self.storage.get_user(username.trim()).await? else {
            warn!(username, "key requested for unknown user");
            return Err(ApiError::Unauthorized);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(anyhow::Error::from)?;

        if !valid {
            warn!(username, "key requested with wrong password");
            return Err(ApiError::Unauthorized);
        }

        let label = label.map(str::to_string).unwrap_or_else(|| user.username.clone());
        self.issue_key(Some(&label)).await
    }
}

#[derive(Debug, Deserialize)]
struct CredentialQuery {
    api_key: Option<String>,
}

/// Pull the API key from the `X-API-Key` header, falling back to the
/// `api_key` query parameter used by browser pages.
pub fn request_credential(request: &Request) -> Option<String> {
    if let Some(value) = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        return Some(value.to_string());
    }

    Query::<CredentialQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.api_key)
}

pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Response {
    let credential = request_credential(&request);

    match auth_service.require(credential.as_deref()).await {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
