//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Itemized cost lines for one manufacturing process.
///
/// Keys are stable so downstream UIs can render a cost table without
/// re-deriving it; lines that do not apply to the process are zero.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub paper: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub plates: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub calage: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub roulage: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub clicks: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub setup: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub binding: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub folding: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub lamination: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub packaging: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Response for a single-tenant calculation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub digital_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub offset_total: Decimal,
    pub digital_breakdown: CostBreakdown,
    pub offset_breakdown: CostBreakdown,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub weight_per_copy_grams: Decimal,
}

/// One tenant's entry in a batch response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuoteResponse {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    #[serde(flatten)]
    pub quote: QuoteResponse,
}

/// Per-tenant error entry in a batch response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuoteError {
    pub tenant_id: Uuid,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response for a batch calculation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuoteResponse {
    pub results: Vec<TenantQuoteResponse>,
    pub errors: Vec<TenantQuoteError>,
}

/// Generic pricing error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
