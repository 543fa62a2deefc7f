//! Request DTOs for pricing API endpoints.
//!
//! Field names follow the order-entry wizard's JSON (camelCase).

use serde::Deserialize;
use uuid::Uuid;

use super::models::{LaminationMode, ProductType};

/// A finished or open format selection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatSpec {
    pub name: String,
    pub width_cm: f64,
    pub height_cm: f64,
}

/// Paper selection for one zone (interior or cover)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSelection {
    pub paper_type_id: String,
    pub grammage: i32,
}

/// A fold selection (type + how many folds)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldSelection {
    pub fold_type_id: String,
    pub fold_count: i32,
}

/// One delivery destination with its sub-quantity
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDestination {
    /// Zone or department code, e.g. "75"
    pub zone: String,
    pub quantity: i64,
}

/// Structured order description resolved by the order-entry wizard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub product_type: ProductType,
    pub quantity: i64,
    pub format: FormatSpec,
    /// Unfolded sheet size for folded/bound pieces
    #[serde(default)]
    pub open_format: Option<FormatSpec>,
    #[serde(default)]
    pub pages_interior: Option<i32>,
    #[serde(default)]
    pub pages_cover: i32,
    #[serde(default)]
    pub flap_size_cm: f64,
    pub paper_interior: PaperSelection,
    #[serde(default)]
    pub paper_cover: Option<PaperSelection>,
    pub color_mode_interior: String,
    #[serde(default)]
    pub color_mode_cover: Option<String>,
    pub recto_verso: bool,
    #[serde(default)]
    pub binding_type_id: Option<String>,
    #[serde(default)]
    pub fold: Option<FoldSelection>,
    #[serde(default)]
    pub secondary_fold: Option<FoldSelection>,
    #[serde(default)]
    pub lamination_mode: Option<LaminationMode>,
    #[serde(default)]
    pub lamination_finish_id: Option<String>,
    #[serde(default)]
    pub packaging_option_ids: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<DeliveryDestination>,
}

impl QuoteInput {
    /// The piece layout the press works from: open format when the piece is
    /// folded or bound, finished format otherwise
    pub fn layout_format(&self) -> &FormatSpec {
        self.open_format.as_ref().unwrap_or(&self.format)
    }
}

/// Request for a single-tenant calculation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub tenant_id: Uuid,
    #[serde(flatten)]
    pub input: QuoteInput,
}

/// Request for a batch calculation across several tenants
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuoteRequest {
    pub quote_input: QuoteInput,
    pub tenant_ids: Vec<Uuid>,
}
