mod credential;
mod url;

pub use credential::{ApiKeyRecord, CreateUserRequest, IssueKeyRequest, UserRecord};
pub use url::{
    format_timestamp, CreateUrlRequest, DeleteUrlRequest, MappingAnalytics, MappingSummary,
    NewMapping, Overview, UrlMapping, UsageTotals, ViewOutcome, TIMESTAMP_FORMAT,
};
