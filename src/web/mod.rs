//! Browser-facing pages: the shortening form and analytics views.

pub mod handlers;
pub mod pages;
pub mod routes;

pub use routes::create_web_router;
