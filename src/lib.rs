pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod redirect;
pub mod shortener;
pub mod storage;
pub mod web;
