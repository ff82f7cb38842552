//! Short-code allocation, URL normalization, expiry rules and the mapping
//! service that ties them to storage.

pub mod code;
pub mod expiry;
pub mod normalize;
pub mod service;

pub use code::generate_code;
pub use expiry::{parse_expiry, EXPIRY_OFFSET_HOURS};
pub use normalize::normalize;
pub use service::{CreateMapping, MappingService};
