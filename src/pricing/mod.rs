//! Pricing engine module.
//!
//! Prices a print-production job for digital and offset manufacturing from a
//! tenant's configuration tables. Called by the Django platform via HTTP/JSON
//! for quotation operations.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{compute_quote, round_money, QuoteOutcome};
pub use routes::router;
pub use services::PricingError;
