use anyhow::Context;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Base URL prepended to short codes in responses, always ending in `/`
    pub deploy_url: String,
    pub auth: AuthConfig,
    pub short_codes: ShortCodeConfig,
    pub redirect_status: RedirectMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    None,
    ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortCodeConfig {
    /// Longest caller-supplied short code accepted
    pub max_length: usize,
    /// How many generated codes are tried before a collision is reported
    pub generation_attempts: u32,
}

/// Status code used when redirecting visitors to the source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedirectMode {
    MovedPermanently,
    #[default]
    Found,
    Temporary,
    Permanent,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }

    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim() {
            "301" => Ok(RedirectMode::MovedPermanently),
            "302" => Ok(RedirectMode::Found),
            "307" => Ok(RedirectMode::Temporary),
            "308" => Ok(RedirectMode::Permanent),
            other => anyhow::bail!("REDIRECT_STATUS must be one of 301, 302, 307, 308 (got '{other}')"),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend = match var("DATABASE_BACKEND", "sqlite").to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = var("DATABASE_URL", "sqlite://./shortenme.db");
        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        anyhow::ensure!(
            max_connections > 0,
            "DATABASE_MAX_CONNECTIONS must be a positive integer"
        );

        let host = var("HOST", "127.0.0.1");
        let port = var("PORT", "5000")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let mut deploy_url = var("DEPLOY_URL", "http://localhost:5000/");
        if !deploy_url.ends_with('/') {
            deploy_url.push('/');
        }

        let disable_auth = lookup("DISABLE_AUTH")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let auth_mode = if disable_auth {
            AuthMode::None
        } else {
            match var("AUTH_MODE", "api_key").to_lowercase().as_str() {
                "none" => AuthMode::None,
                "api_key" | "apikey" => AuthMode::ApiKey,
                other => {
                    tracing::warn!(
                        "Unknown AUTH_MODE '{other}', falling back to 'api_key'. Supported values: none, api_key"
                    );
                    AuthMode::ApiKey
                }
            }
        };

        let max_length = var("SHORT_CODE_MAX_LENGTH", "64")
            .parse::<usize>()
            .context("SHORT_CODE_MAX_LENGTH must be a positive integer")?;
        anyhow::ensure!(max_length > 0, "SHORT_CODE_MAX_LENGTH must be a positive integer");
        let generation_attempts = var("CODE_GENERATION_ATTEMPTS", "5")
            .parse::<u32>()
            .context("CODE_GENERATION_ATTEMPTS must be a positive integer")?
            .max(1);

        let redirect_status = RedirectMode::parse(&var("REDIRECT_STATUS", "302"))?;

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            deploy_url,
            auth: AuthConfig { mode: auth_mode },
            short_codes: ShortCodeConfig {
                max_length,
                generation_attempts,
            },
            redirect_status,
        })
    }
}
