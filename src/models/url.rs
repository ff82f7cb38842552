use chrono::DateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Timestamp layout used in every API response and page.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the `urls` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UrlMapping {
    pub id: i64,
    pub created_utc: i64,
    pub expiry: Option<i64>,
    #[sqlx(rename = "url")]
    pub source_url: String,
    #[sqlx(rename = "shorturl")]
    pub short_code: String,
    pub views: i64,
}

impl UrlMapping {
    pub fn analytics(&self) -> MappingAnalytics {
        MappingAnalytics {
            created_utc: format_timestamp(self.created_utc),
            expiry: self.expiry.map(format_timestamp),
            source_url: self.source_url.clone(),
            views: self.views,
        }
    }

    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            short_url: self.short_code.clone(),
            source_url: self.source_url.clone(),
            created_utc: format_timestamp(self.created_utc),
            expiry: self.expiry.map(format_timestamp),
            views: self.views,
        }
    }
}

/// Values written when a mapping is inserted.
#[derive(Debug, Clone)]
pub struct NewMapping<'a> {
    pub short_code: &'a str,
    pub source_url: &'a str,
    pub expiry: Option<i64>,
    pub created_utc: i64,
}

/// Result of an attempted redirect against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The view was counted; holds the source URL.
    Counted(String),
    Expired,
    Missing,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow)]
pub struct UsageTotals {
    pub url_count: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingAnalytics {
    pub created_utc: String,
    pub expiry: Option<String>,
    pub source_url: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingSummary {
    pub short_url: String,
    pub source_url: String,
    pub created_utc: String,
    pub expiry: Option<String>,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub url_count: i64,
    pub total_views: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<MappingSummary>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: Option<String>,
    pub shorturl: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUrlRequest {
    pub shorturl: Option<String>,
}

pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}
