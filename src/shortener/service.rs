use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::code::{generate_code, validate_code};
use super::expiry::{expiry_cutoff, parse_expiry, MALFORMED_EXPIRY};
use super::normalize::normalize;
use crate::config::ShortCodeConfig;
use crate::error::ApiError;
use crate::models::{NewMapping, Overview, UrlMapping, ViewOutcome};
use crate::storage::{Storage, StorageError};

const CODE_TAKEN: &str = "that short URL already exists, please try a different one";
const CODE_UNKNOWN: &str = "No short URL found with that value";

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 500;

/// Input of a create operation, as submitted by a caller.
#[derive(Debug, Clone, Default)]
pub struct CreateMapping {
    pub source_url: String,
    pub short_code: Option<String>,
    pub expiry: Option<String>,
}

/// Create, delete, redirect and reporting operations over stored mappings.
pub struct MappingService {
    storage: Arc<dyn Storage>,
    short_codes: ShortCodeConfig,
}

impl MappingService {
    pub fn new(storage: Arc<dyn Storage>, short_codes: ShortCodeConfig) -> Self {
        Self {
            storage,
            short_codes,
        }
    }

    pub async fn create(&self, request: CreateMapping) -> Result<UrlMapping, ApiError> {
        if request.source_url.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "body parameter 'url' is required, please supply one and try again".to_string(),
            ));
        }
        if request.source_url.chars().any(char::is_control) {
            return Err(ApiError::InvalidInput(
                "body parameter 'url' must not contain control characters".to_string(),
            ));
        }
        let source_url = normalize(&request.source_url);

        let expiry = match non_empty(request.expiry) {
            Some(raw) => Some(
                parse_expiry(&raw)
                    .ok_or_else(|| ApiError::InvalidInput(MALFORMED_EXPIRY.to_string()))?
                    .timestamp(),
            ),
            None => None,
        };

        let created_utc = Utc::now().timestamp();

        if let Some(code) = non_empty(request.short_code) {
            validate_code(&code, self.short_codes.max_length).map_err(ApiError::InvalidInput)?;

            let mapping = NewMapping {
                short_code: &code,
                source_url: &source_url,
                expiry,
                created_utc,
            };
            return match self.storage.insert_mapping(&mapping).await {
                Ok(created) => {
                    info!(short_code = %created.short_code, "created mapping");
                    Ok(created)
                }
                Err(StorageError::Conflict) => {
                    warn!(short_code = %code, "short code already taken");
                    Err(ApiError::Conflict(CODE_TAKEN.to_string()))
                }
                Err(e) => Err(e.into()),
            };
        }

        for attempt in 1..=self.short_codes.generation_attempts {
            let code = generate_code();
            let mapping = NewMapping {
                short_code: &code,
                source_url: &source_url,
                expiry,
                created_utc,
            };
            match self.storage.insert_mapping(&mapping).await {
                Ok(created) => {
                    info!(short_code = %created.short_code, "created mapping");
                    return Ok(created);
                }
                Err(StorageError::Conflict) => {
                    warn!(short_code = %code, attempt, "generated short code collided");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::Conflict(CODE_TAKEN.to_string()))
    }

    pub async fn delete(&self, short_code: &str) -> Result<(), ApiError> {
        if self.storage.delete_mapping(short_code).await? {
            info!(short_code, "deleted mapping");
            Ok(())
        } else {
            Err(ApiError::NotFound(CODE_UNKNOWN.to_string()))
        }
    }

    /// Resolve a short code for a visitor, counting the view.
    pub async fn redirect(&self, short_code: &str) -> Result<String, ApiError> {
        self.redirect_at(short_code, Utc::now()).await
    }

    pub async fn redirect_at(
        &self,
        short_code: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        match self
            .storage
            .record_view(short_code, expiry_cutoff(now))
            .await?
        {
            ViewOutcome::Counted(source_url) => Ok(source_url),
            ViewOutcome::Expired => {
                info!(short_code, "refused redirect to expired mapping");
                Err(ApiError::Expired)
            }
            ViewOutcome::Missing => Err(ApiError::NotFound(
                "sorry, that URL doesn't exist".to_string(),
            )),
        }
    }

    pub async fn analytics(&self, short_code: &str) -> Result<UrlMapping, ApiError> {
        self.storage
            .get_mapping(short_code)
            .await?
            .ok_or_else(|| ApiError::NotFound(CODE_UNKNOWN.to_string()))
    }

    /// Aggregate counters, optionally with one page of rows (newest first).
    pub async fn overview(&self, page: Option<(i64, i64)>) -> Result<Overview, ApiError> {
        let totals = self.storage.usage_totals().await?;

        let urls = match page {
            Some((limit, offset)) => {
                let limit = limit.clamp(1, MAX_LIST_LIMIT);
                let offset = offset.max(0);
                let rows = self.storage.list_mappings(limit, offset).await?;
                Some(rows.iter().map(UrlMapping::summary).collect())
            }
            None => None,
        };

        Ok(Overview {
            url_count: totals.url_count,
            total_views: totals.total_views,
            urls,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use chrono::{Duration, TimeZone};

    async fn setup_service() -> MappingService {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        MappingService::new(
            Arc::new(storage),
            ShortCodeConfig {
                max_length: 64,
                generation_attempts: 5,
            },
        )
    }

    fn request(url: &str, code: Option<&str>, expiry: Option<&str>) -> CreateMapping {
        CreateMapping {
            source_url: url.to_string(),
            short_code: code.map(str::to_string),
            expiry: expiry.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_generates_code_and_normalizes() {
        let service = setup_service().await;
        let created = service.create(request("google.com", None, None)).await.unwrap();

        assert_eq!(created.short_code.len(), 8);
        assert_eq!(created.source_url, "http://google.com");
        assert_eq!(created.views, 0);
        assert_eq!(created.expiry, None);
    }

    #[tokio::test]
    async fn test_empty_optional_fields_are_absent() {
        let service = setup_service().await;
        let created = service
            .create(request("example.com", Some(""), Some("  ")))
            .await
            .unwrap();
        assert_eq!(created.short_code.len(), 8);
        assert_eq!(created.expiry, None);
    }

    #[tokio::test]
    async fn test_missing_url_is_invalid() {
        let service = setup_service().await;
        let err = service.create(request("   ", None, None)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_url_with_control_characters_is_invalid() {
        let service = setup_service().await;
        for url in ["example.com/a\nLocation: evil", "example.com/\r", "example.com/\u{7f}"] {
            let err = service
                .create(request(url, Some("ctrl"), None))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)), "{url:?}");
        }
        assert!(service.analytics("ctrl").await.is_err(), "nothing should be stored");
    }

    #[tokio::test]
    async fn test_malformed_expiry_is_invalid() {
        let service = setup_service().await;
        let err = service
            .create(request("example.com", Some("bad"), Some("soon-ish")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(service.analytics("bad").await.is_err(), "nothing should be stored");
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts_and_keeps_original() {
        let service = setup_service().await;
        service
            .create(request("first.example.com", Some("dup"), None))
            .await
            .unwrap();

        let err = service
            .create(request("second.example.com", Some("dup"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let stored = service.analytics("dup").await.unwrap();
        assert_eq!(stored.source_url, "http://first.example.com");
    }

    #[tokio::test]
    async fn test_redirect_counts_views() {
        let service = setup_service().await;
        service
            .create(request("https://example.com/x", Some("views"), None))
            .await
            .unwrap();

        for expected in 1..=3 {
            let target = service.redirect("views").await.unwrap();
            assert_eq!(target, "https://example.com/x");
            assert_eq!(service.analytics("views").await.unwrap().views, expected);
        }
    }

    #[tokio::test]
    async fn test_expired_redirect_does_not_count() {
        let service = setup_service().await;
        service
            .create(request("example.com", Some("short7"), Some("2022-02-14T23:35:00")))
            .await
            .unwrap();

        let err = service.redirect("short7").await.unwrap_err();
        assert!(matches!(err, ApiError::Expired));
        assert_eq!(service.analytics("short7").await.unwrap().views, 0);
    }

    // Expiry is only enforced eight hours after the stored timestamp.
    #[tokio::test]
    async fn test_redirect_within_offset_window_still_works() {
        let service = setup_service().await;
        service
            .create(request("example.com", Some("grace"), Some("2024-06-01T12:00:00")))
            .await
            .unwrap();

        let expiry = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(service
            .redirect_at("grace", expiry + Duration::hours(7))
            .await
            .is_ok());
        assert!(matches!(
            service
                .redirect_at("grace", expiry + Duration::hours(9))
                .await
                .unwrap_err(),
            ApiError::Expired
        ));
        assert_eq!(service.analytics("grace").await.unwrap().views, 1);
    }

    #[tokio::test]
    async fn test_delete_then_redirect_is_not_found() {
        let service = setup_service().await;
        service
            .create(request("example.com", Some("gone"), None))
            .await
            .unwrap();

        service.delete("gone").await.unwrap();
        assert!(matches!(
            service.redirect("gone").await.unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            service.delete("gone").await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_overview_totals() {
        let service = setup_service().await;
        let empty = service.overview(None).await.unwrap();
        assert_eq!(empty.url_count, 0);
        assert_eq!(empty.total_views, 0);
        assert!(empty.urls.is_none());

        service.create(request("a.com", Some("a"), None)).await.unwrap();
        service.create(request("b.com", Some("b"), None)).await.unwrap();
        service.redirect("a").await.unwrap();
        service.redirect("a").await.unwrap();
        service.redirect("b").await.unwrap();

        let overview = service.overview(Some((10, 0))).await.unwrap();
        assert_eq!(overview.url_count, 2);
        assert_eq!(overview.total_views, 3);
        assert_eq!(overview.urls.unwrap().len(), 2);
    }
}
