//! PrintOps pricing engine.
//!
//! Axum service that prices print-production jobs (brochures, leaflets,
//! flyers, business cards) for digital and offset manufacturing from
//! per-tenant configuration tables. Called by the Django platform via
//! HTTP/JSON; the engine itself persists nothing.

use sqlx::PgPool;

pub mod cache;
pub mod error;
pub mod pricing;

pub use cache::AppCache;
pub use error::{AppError, Result};

/// Shared application state for axum handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}
