use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Stored API key metadata. The key itself is never persisted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiKeyRecord {
    pub id: i64,
    pub label: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueKeyRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub label: Option<String>,
}
