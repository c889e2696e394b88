/// Post Service Library
///
/// Users, stateless sessions and post aggregates (a post with its ordered
/// content blocks, comments, likes and views) behind an Actix-web API.
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

pub use app::AppServices;
pub use config::Config;
pub use error::{AppError, Result};
