//! Configuration-table models for the pricing engine.
//!
//! Row types use sqlx's FromRow derive for direct database deserialization.
//! Every configurable row carries `tenant_id: Option<Uuid>`; NULL marks a
//! platform default that a tenant-scoped row of the same logical key
//! overrides. The resolved, layered result of all table reads for one tenant
//! is a [`PricingConfig`] snapshot, immutable for the duration of a
//! calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Product families the engine can price.
///
/// A closed set: unknown tags in requests or in packaging-option
/// associations are rejected, not silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "BROCHURE")]
    Brochure,
    #[serde(rename = "DEPLIANT")]
    Depliant,
    #[serde(rename = "FLYER")]
    Flyer,
    #[serde(rename = "CARTE_DE_VISITE")]
    CarteDeVisite,
}

impl ProductType {
    /// True for products with a bound/folded multi-page interior
    pub fn requires_interior_pages(self) -> bool {
        matches!(self, ProductType::Brochure | ProductType::Depliant)
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BROCHURE" => Ok(ProductType::Brochure),
            "DEPLIANT" => Ok(ProductType::Depliant),
            "FLYER" => Ok(ProductType::Flyer),
            "CARTE_DE_VISITE" => Ok(ProductType::CarteDeVisite),
            other => Err(format!("unknown product type tag '{}'", other)),
        }
    }
}

/// Manufacturing process being priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Process {
    Digital,
    Offset,
}

/// Which sides of the sheet receive lamination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaminationMode {
    #[serde(rename = "RECTO")]
    Recto,
    #[serde(rename = "RECTO_VERSO")]
    RectoVerso,
}

/// Paper stock row from pricing_paper_grammage
#[derive(Debug, Clone, FromRow)]
pub struct PaperGrammage {
    pub tenant_id: Option<Uuid>,
    pub paper_type_code: String,
    pub grammage: i32,
    /// Weight of 1000 machine sheets, in grams
    pub weight_per_1000_sheets: Decimal,
    pub price_per_kg: Decimal,
    pub available_for_dos_carre: bool,
}

/// Color mode row from pricing_color_mode
#[derive(Debug, Clone, FromRow)]
pub struct ColorMode {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub plates_per_side: i32,
    pub click_multiplier: Decimal,
}

/// Binding type row from pricing_binding_type
#[derive(Debug, Clone, FromRow)]
pub struct BindingType {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub is_dos_carre: bool,
}

/// Digital binding tier from pricing_binding_tier_digital
///
/// Page and quantity ranges for one binding type must be mutually exclusive
/// and jointly exhaustive over the domain the order wizard allows.
#[derive(Debug, Clone, FromRow)]
pub struct BindingTierDigital {
    pub tenant_id: Option<Uuid>,
    pub binding_type_code: String,
    pub page_range_min: i32,
    pub page_range_max: i32,
    pub qty_min: i64,
    pub qty_max: i64,
    pub per_unit_cost: Decimal,
    pub setup_cost: Decimal,
}

/// Offset binding tier from pricing_binding_tier_offset, keyed by the exact
/// number of folded sections (cover included)
#[derive(Debug, Clone, FromRow)]
pub struct BindingTierOffset {
    pub tenant_id: Option<Uuid>,
    pub binding_type_code: String,
    pub cahiers_count: i32,
    pub calage_cost: Decimal,
    pub roulage_per_1000: Decimal,
}

/// Fold type row from pricing_fold_type
#[derive(Debug, Clone, FromRow)]
pub struct FoldType {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub max_folds: i32,
    pub can_be_secondary: bool,
}

/// Per-fold-count cost from pricing_fold_cost
#[derive(Debug, Clone, FromRow)]
pub struct FoldCost {
    pub tenant_id: Option<Uuid>,
    pub fold_type_code: String,
    pub num_folds: i32,
    pub cost: Decimal,
}

/// Lamination finish row from pricing_lamination_finish
#[derive(Debug, Clone, FromRow)]
pub struct LaminationFinish {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub offset_price_per_m2: Decimal,
    pub offset_calage_forfait: Decimal,
    pub offset_minimum_billing: Option<Decimal>,
}

/// Digital lamination tier from pricing_lamination_tier
#[derive(Debug, Clone, FromRow)]
pub struct LaminationTier {
    pub tenant_id: Option<Uuid>,
    pub finish_code: String,
    pub qty_min: i64,
    pub qty_max: i64,
    pub price_per_sheet: Decimal,
    pub setup_cost: Decimal,
}

/// Raw packaging option row from pricing_packaging_option
#[derive(Debug, Clone, FromRow)]
pub struct PackagingOptionRow {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub cost_per_unit: Decimal,
    pub cost_per_order: Decimal,
    pub product_types: Vec<String>,
}

/// Packaging option with its product-type tags parsed into the closed set
#[derive(Debug, Clone)]
pub struct PackagingOption {
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub cost_per_unit: Decimal,
    pub cost_per_order: Decimal,
    pub product_types: Vec<ProductType>,
}

impl TryFrom<PackagingOptionRow> for PackagingOption {
    type Error = String;

    fn try_from(row: PackagingOptionRow) -> Result<Self, Self::Error> {
        let product_types = row
            .product_types
            .iter()
            .map(|tag| {
                tag.parse::<ProductType>()
                    .map_err(|e| format!("packaging option '{}': {}", row.code, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PackagingOption {
            tenant_id: row.tenant_id,
            code: row.code,
            name: row.name,
            cost_per_unit: row.cost_per_unit,
            cost_per_order: row.cost_per_order,
            product_types,
        })
    }
}

impl PackagingOption {
    pub fn applies_to(&self, product: ProductType) -> bool {
        self.product_types.contains(&product)
    }
}

/// Carrier rate bracket from pricing_delivery_rate
///
/// For a zone, rows form an ascending ladder of weight ceilings; the first
/// ceiling at or above the shipment weight applies.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRate {
    pub tenant_id: Option<Uuid>,
    pub carrier: String,
    pub zone: String,
    pub max_weight_kg: Decimal,
    pub price: Decimal,
}

/// Press/machine sheet format from pricing_machine_format
#[derive(Debug, Clone, FromRow)]
pub struct MachineFormat {
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub width_cm: f64,
    pub height_cm: f64,
    pub is_default: bool,
}

/// Per-format click divisor pair from pricing_click_divisor
#[derive(Debug, Clone, FromRow)]
pub struct ClickDivisor {
    pub tenant_id: Option<Uuid>,
    pub format_name: String,
    pub divisor_recto: Decimal,
    pub divisor_recto_verso: Decimal,
}

/// One scalar parameter row from pricing_scalar_config
#[derive(Debug, Clone, FromRow)]
pub struct ScalarRow {
    pub tenant_id: Option<Uuid>,
    pub domain: String,
    pub key: String,
    pub value: Decimal,
    pub unit: Option<String>,
}

/// Tenant directory row from printops_tenant
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
}

/// Flat key/value scalar map for one domain (offset, digital, margin)
#[derive(Debug, Clone, Default)]
pub struct ScalarConfig {
    pub domain: String,
    values: HashMap<String, Decimal>,
}

impl ScalarConfig {
    pub fn new(domain: &str, rows: impl IntoIterator<Item = ScalarRow>) -> Self {
        Self {
            domain: domain.to_string(),
            values: rows.into_iter().map(|r| (r.key, r.value)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.values.get(key).copied()
    }
}

/// Resolved, tenant-layered configuration snapshot.
///
/// Owned by one calculation; the engine never writes configuration.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub tenant_id: Uuid,
    pub paper_grammages: Vec<PaperGrammage>,
    pub color_modes: Vec<ColorMode>,
    pub binding_types: Vec<BindingType>,
    pub binding_tiers_digital: Vec<BindingTierDigital>,
    pub binding_tiers_offset: Vec<BindingTierOffset>,
    pub fold_types: Vec<FoldType>,
    pub fold_costs: Vec<FoldCost>,
    pub lamination_finishes: Vec<LaminationFinish>,
    pub lamination_tiers: Vec<LaminationTier>,
    pub packaging_options: Vec<PackagingOption>,
    pub delivery_rates: Vec<DeliveryRate>,
    pub machine_formats: Vec<MachineFormat>,
    pub click_divisors: Vec<ClickDivisor>,
    pub offset: ScalarConfig,
    pub digital: ScalarConfig,
    pub margin: ScalarConfig,
}

impl PricingConfig {
    pub fn paper_grammage(&self, paper_type_code: &str, grammage: i32) -> Option<&PaperGrammage> {
        self.paper_grammages
            .iter()
            .find(|p| p.paper_type_code == paper_type_code && p.grammage == grammage)
    }

    pub fn color_mode(&self, code: &str) -> Option<&ColorMode> {
        self.color_modes.iter().find(|c| c.code == code)
    }

    pub fn binding_type(&self, code: &str) -> Option<&BindingType> {
        self.binding_types.iter().find(|b| b.code == code)
    }

    pub fn fold_type(&self, code: &str) -> Option<&FoldType> {
        self.fold_types.iter().find(|f| f.code == code)
    }

    pub fn lamination_finish(&self, code: &str) -> Option<&LaminationFinish> {
        self.lamination_finishes.iter().find(|f| f.code == code)
    }

    pub fn packaging_option(&self, code: &str) -> Option<&PackagingOption> {
        self.packaging_options.iter().find(|p| p.code == code)
    }

    pub fn click_divisor(&self, format_name: &str) -> Option<&ClickDivisor> {
        self.click_divisors.iter().find(|d| d.format_name == format_name)
    }

    /// Machine formats with the tenant's default first, so a strict-max ups
    /// scan naturally prefers the default on ties
    pub fn machine_formats_default_first(&self) -> Vec<&MachineFormat> {
        let mut formats: Vec<&MachineFormat> = self.machine_formats.iter().collect();
        formats.sort_by_key(|f| !f.is_default);
        formats
    }

    /// Rate ladder for a delivery zone, ascending by weight ceiling
    pub fn delivery_ladder(&self, zone: &str) -> Vec<&DeliveryRate> {
        let mut ladder: Vec<&DeliveryRate> = self
            .delivery_rates
            .iter()
            .filter(|r| r.zone == zone)
            .collect();
        ladder.sort_by(|a, b| a.max_weight_kg.cmp(&b.max_weight_kg));
        ladder
    }
}

#[cfg(test)]
impl PricingConfig {
    /// Empty snapshot for building test fixtures
    pub fn empty(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            paper_grammages: vec![],
            color_modes: vec![],
            binding_types: vec![],
            binding_tiers_digital: vec![],
            binding_tiers_offset: vec![],
            fold_types: vec![],
            fold_costs: vec![],
            lamination_finishes: vec![],
            lamination_tiers: vec![],
            packaging_options: vec![],
            delivery_rates: vec![],
            machine_formats: vec![],
            click_divisors: vec![],
            offset: ScalarConfig::default(),
            digital: ScalarConfig::default(),
            margin: ScalarConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_type_rejects_unknown_tag() {
        assert!("BROCHURE".parse::<ProductType>().is_ok());
        assert!("AFFICHE".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_packaging_option_parse_rejects_unknown_tag() {
        let row = PackagingOptionRow {
            tenant_id: None,
            code: "carton".to_string(),
            name: "Carton".to_string(),
            cost_per_unit: dec!(0.01),
            cost_per_order: dec!(5),
            product_types: vec!["FLYER".to_string(), "POSTER".to_string()],
        };
        let err = PackagingOption::try_from(row).unwrap_err();
        assert!(err.contains("POSTER"));
    }

    #[test]
    fn test_delivery_ladder_sorted_ascending() {
        let mut config = PricingConfig::empty(Uuid::nil());
        config.delivery_rates = vec![
            DeliveryRate {
                tenant_id: None,
                carrier: "colis_prive".to_string(),
                zone: "75".to_string(),
                max_weight_kg: dec!(30),
                price: dec!(18.50),
            },
            DeliveryRate {
                tenant_id: None,
                carrier: "colis_prive".to_string(),
                zone: "75".to_string(),
                max_weight_kg: dec!(5),
                price: dec!(9.90),
            },
        ];

        let ladder = config.delivery_ladder("75");
        assert_eq!(ladder[0].max_weight_kg, dec!(5));
        assert_eq!(ladder[1].max_weight_kg, dec!(30));
        assert!(config.delivery_ladder("99").is_empty());
    }

    #[test]
    fn test_machine_formats_default_first() {
        let mk = |name: &str, is_default: bool| MachineFormat {
            tenant_id: None,
            name: name.to_string(),
            width_cm: 45.0,
            height_cm: 32.0,
            is_default,
        };
        let mut config = PricingConfig::empty(Uuid::nil());
        config.machine_formats = vec![mk("32x45", false), mk("sra3", true)];

        let ordered = config.machine_formats_default_first();
        assert_eq!(ordered[0].name, "sra3");
    }
}
