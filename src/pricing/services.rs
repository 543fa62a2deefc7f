//! Pricing service functions: validation, configuration fetch, orchestration.
//!
//! The calculation itself is pure (see `calculators`); these functions fetch
//! and cache the tenant's configuration snapshot, validate the input before
//! any calculator runs, and fan a batch request out across tenants.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;

use super::calculators::compute_quote;
use super::models::{PricingConfig, Tenant};
use super::queries;
use super::requests::QuoteInput;
use super::responses::{
    BatchQuoteResponse, QuoteResponse, TenantQuoteError, TenantQuoteResponse,
};

/// How long a configuration fetch may take before the calculation fails
const CONFIG_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How many tenants a batch request prices concurrently
const BATCH_CONCURRENCY: usize = 8;

/// Human-readable message surfaced for every calculation failure; the
/// structured details carry what the administrator needs to fix
pub const USER_MESSAGE: &str = "impossible de calculer le prix";

/// Pricing calculation error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum PricingError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("missing configuration row in {table} for {key}")]
    MissingConfiguration { table: String, key: String },

    #[error("configuration fetch failed: {0}")]
    Database(String),

    #[error("configuration fetch timed out")]
    Timeout,
}

impl PricingError {
    pub fn validation(message: impl Into<String>) -> Self {
        PricingError::Validation {
            message: message.into(),
        }
    }

    pub fn missing(table: impl Into<String>, key: impl Into<String>) -> Self {
        PricingError::MissingConfiguration {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Stable machine-readable discriminant for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::Validation { .. } => "validation_error",
            PricingError::MissingConfiguration { .. } => "configuration_missing",
            PricingError::Database(_) => "database_error",
            PricingError::Timeout => "timeout",
        }
    }

    /// Structured detail for the administrator (which table, which key)
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            PricingError::Validation { message } => Some(json!({ "message": message })),
            PricingError::MissingConfiguration { table, key } => {
                Some(json!({ "table": table, "key": key }))
            }
            PricingError::Database(_) | PricingError::Timeout => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the input for malformed or logically inconsistent selections.
///
/// Runs before any calculator; fold and packaging checks consult the
/// configuration because their limits live there.
pub fn validate_input(config: &PricingConfig, input: &QuoteInput) -> Result<(), PricingError> {
    if input.quantity <= 0 {
        return Err(PricingError::validation("quantity must be positive"));
    }
    if input.format.width_cm <= 0.0 || input.format.height_cm <= 0.0 {
        return Err(PricingError::validation("format dimensions must be positive"));
    }
    if let Some(open) = &input.open_format {
        if open.width_cm <= 0.0 || open.height_cm <= 0.0 {
            return Err(PricingError::validation(
                "open format dimensions must be positive",
            ));
        }
    }
    if input.flap_size_cm < 0.0 {
        return Err(PricingError::validation("flap size cannot be negative"));
    }

    if input.product_type.requires_interior_pages() {
        match input.pages_interior {
            Some(pages) if pages > 0 => {}
            _ => {
                return Err(PricingError::validation(format!(
                    "{:?} requires a positive interior page count",
                    input.product_type
                )))
            }
        }
    }
    if input.binding_type_id.is_some() && input.pages_interior.unwrap_or(0) <= 0 {
        return Err(PricingError::validation(
            "a bound product requires an interior page count",
        ));
    }

    if input.pages_cover > 0 {
        if input.paper_cover.is_none() {
            return Err(PricingError::validation(
                "cover pages require a cover paper selection",
            ));
        }
        if input.color_mode_cover.is_none() {
            return Err(PricingError::validation(
                "cover pages require a cover color mode",
            ));
        }
    }

    if let Some(fold) = &input.fold {
        let fold_type = config
            .fold_type(&fold.fold_type_id)
            .ok_or_else(|| PricingError::missing("pricing_fold_type", &fold.fold_type_id))?;
        if fold.fold_count < 1 || fold.fold_count > fold_type.max_folds {
            return Err(PricingError::validation(format!(
                "fold count {} outside 1..={} for fold type {}",
                fold.fold_count, fold_type.max_folds, fold_type.code
            )));
        }
    }
    if let Some(secondary) = &input.secondary_fold {
        if input.fold.is_none() {
            return Err(PricingError::validation(
                "a secondary fold requires a primary fold",
            ));
        }
        let fold_type = config
            .fold_type(&secondary.fold_type_id)
            .ok_or_else(|| PricingError::missing("pricing_fold_type", &secondary.fold_type_id))?;
        if !fold_type.can_be_secondary {
            return Err(PricingError::validation(format!(
                "fold type {} cannot be used as a secondary fold",
                fold_type.code
            )));
        }
        if secondary.fold_count < 1 || secondary.fold_count > fold_type.max_folds {
            return Err(PricingError::validation(format!(
                "fold count {} outside 1..={} for fold type {}",
                secondary.fold_count, fold_type.max_folds, fold_type.code
            )));
        }
    }

    if input.lamination_mode.is_some() != input.lamination_finish_id.is_some() {
        return Err(PricingError::validation(
            "lamination requires both a mode and a finish",
        ));
    }

    for code in &input.packaging_option_ids {
        let option = config
            .packaging_option(code)
            .ok_or_else(|| PricingError::missing("pricing_packaging_option", code))?;
        if !option.applies_to(input.product_type) {
            return Err(PricingError::validation(format!(
                "packaging option {} does not apply to {:?}",
                option.code, input.product_type
            )));
        }
    }

    for destination in &input.destinations {
        if destination.quantity <= 0 {
            return Err(PricingError::validation(
                "delivery destination quantity must be positive",
            ));
        }
        if destination.zone.is_empty() {
            return Err(PricingError::validation("delivery destination zone is empty"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Validate and price one input against one resolved snapshot
pub fn evaluate_quote(
    config: &PricingConfig,
    input: &QuoteInput,
) -> Result<QuoteResponse, PricingError> {
    validate_input(config, input)?;
    let outcome = compute_quote(config, input)?;
    Ok(QuoteResponse {
        digital_total: outcome.digital_total,
        offset_total: outcome.offset_total,
        digital_breakdown: outcome.digital_breakdown,
        offset_breakdown: outcome.offset_breakdown,
        delivery_cost: outcome.delivery_cost,
        weight_per_copy_grams: outcome.weight_per_copy_grams,
    })
}

/// One tenant's entry for the batch path: the error side carries the
/// per-tenant failure without affecting siblings
pub fn evaluate_for_tenant(
    tenant: &Tenant,
    config: &PricingConfig,
    input: &QuoteInput,
) -> Result<TenantQuoteResponse, TenantQuoteError> {
    match evaluate_quote(config, input) {
        Ok(quote) => Ok(TenantQuoteResponse {
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            quote,
        }),
        Err(err) => {
            warn!(tenant = %tenant.id, error = %err, "quote calculation failed");
            Err(TenantQuoteError {
                tenant_id: tenant.id,
                error_type: err.error_type().to_string(),
                message: USER_MESSAGE.to_string(),
                details: err.details(),
            })
        }
    }
}

/// Fetch the resolved configuration snapshot for a tenant, cache-first.
///
/// The fetch is the calculation's only I/O and the only step with a timeout.
pub async fn fetch_config(
    pool: &PgPool,
    cache: &AppCache,
    tenant_id: Uuid,
) -> Result<Arc<PricingConfig>, PricingError> {
    if let Some(cached) = cache.configs.get(&tenant_id).await {
        debug!(tenant = %tenant_id, "config cache HIT");
        return Ok(cached);
    }
    debug!(tenant = %tenant_id, "config cache MISS");

    let loaded = tokio::time::timeout(
        CONFIG_FETCH_TIMEOUT,
        queries::load_pricing_config(pool, tenant_id),
    )
    .await
    .map_err(|_| PricingError::Timeout)?
    .map_err(|e| PricingError::Database(e.to_string()))?;

    let config = Arc::new(loaded);
    cache.configs.insert(tenant_id, config.clone()).await;
    Ok(config)
}

/// Look up a tenant directory row, cache-first. `None` means the tenant does
/// not exist for this platform; the batch path skips it silently.
async fn fetch_tenant(
    pool: &PgPool,
    cache: &AppCache,
    tenant_id: Uuid,
) -> Result<Option<Arc<Tenant>>, PricingError> {
    if let Some(cached) = cache.tenants.get(&tenant_id).await {
        return Ok(Some(cached));
    }

    let tenant = queries::get_tenant(pool, tenant_id)
        .await
        .map_err(|e| PricingError::Database(e.to_string()))?;

    match tenant {
        Some(tenant) => {
            let tenant = Arc::new(tenant);
            cache.tenants.insert(tenant_id, tenant.clone()).await;
            Ok(Some(tenant))
        }
        None => Ok(None),
    }
}

/// Calculate a quote for one tenant
pub async fn calculate_quote(
    pool: &PgPool,
    cache: &AppCache,
    tenant_id: Uuid,
    input: &QuoteInput,
) -> Result<QuoteResponse, PricingError> {
    let config = fetch_config(pool, cache, tenant_id).await?;
    evaluate_quote(&config, input)
}

/// Calculate quotes for every requested tenant.
///
/// Tenant calculations are independent; they run concurrently with a bounded
/// fan-out and one tenant's failure never aborts the others. Unknown tenant
/// ids are skipped (whether a tenant may be quoted is the platform's call,
/// not the engine's).
pub async fn calculate_quote_batch(
    pool: &PgPool,
    cache: &AppCache,
    input: &QuoteInput,
    tenant_ids: &[Uuid],
) -> BatchQuoteResponse {
    let entries: Vec<Option<Result<TenantQuoteResponse, TenantQuoteError>>> =
        stream::iter(tenant_ids.iter().copied())
            .map(|tenant_id| async move {
                let tenant = match fetch_tenant(pool, cache, tenant_id).await {
                    Ok(Some(tenant)) => tenant,
                    Ok(None) => {
                        debug!(tenant = %tenant_id, "unknown tenant skipped in batch");
                        return None;
                    }
                    Err(err) => {
                        return Some(Err(TenantQuoteError {
                            tenant_id,
                            error_type: err.error_type().to_string(),
                            message: USER_MESSAGE.to_string(),
                            details: err.details(),
                        }))
                    }
                };

                let config = match fetch_config(pool, cache, tenant_id).await {
                    Ok(config) => config,
                    Err(err) => {
                        return Some(Err(TenantQuoteError {
                            tenant_id,
                            error_type: err.error_type().to_string(),
                            message: USER_MESSAGE.to_string(),
                            details: err.details(),
                        }))
                    }
                };

                Some(evaluate_for_tenant(&tenant, &config, input))
            })
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for entry in entries.into_iter().flatten() {
        match entry {
            Ok(result) => results.push(result),
            Err(error) => errors.push(error),
        }
    }

    info!(
        requested = tenant_ids.len(),
        priced = results.len(),
        failed = errors.len(),
        "batch quote calculated"
    );

    BatchQuoteResponse { results, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::*;
    use crate::pricing::requests::{FoldSelection, FormatSpec, PaperSelection, QuoteInput};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn scalar(domain: &str, key: &str, value: Decimal) -> ScalarRow {
        ScalarRow {
            tenant_id: None,
            domain: domain.to_string(),
            key: key.to_string(),
            value,
            unit: None,
        }
    }

    fn fixture_config(tenant_id: Uuid) -> PricingConfig {
        let mut config = PricingConfig::empty(tenant_id);
        config.machine_formats = vec![MachineFormat {
            tenant_id: None,
            name: "45x32".to_string(),
            width_cm: 45.0,
            height_cm: 32.0,
            is_default: true,
        }];
        config.click_divisors = vec![ClickDivisor {
            tenant_id: None,
            format_name: "45x32".to_string(),
            divisor_recto: dec!(1),
            divisor_recto_verso: dec!(2),
        }];
        config.paper_grammages = vec![PaperGrammage {
            tenant_id: None,
            paper_type_code: "couche_mat".to_string(),
            grammage: 135,
            weight_per_1000_sheets: dec!(19440),
            price_per_kg: dec!(1.20),
            available_for_dos_carre: true,
        }];
        config.color_modes = vec![ColorMode {
            tenant_id: None,
            code: "quadri".to_string(),
            name: "Quadrichromie".to_string(),
            plates_per_side: 4,
            click_multiplier: dec!(1),
        }];
        config.fold_types = vec![FoldType {
            tenant_id: None,
            code: "roule".to_string(),
            name: "Pli roule".to_string(),
            max_folds: 3,
            can_be_secondary: false,
        }];
        config.fold_costs = vec![FoldCost {
            tenant_id: None,
            fold_type_code: "roule".to_string(),
            num_folds: 2,
            cost: dec!(18),
        }];
        config.packaging_options = vec![PackagingOption {
            tenant_id: None,
            code: "film".to_string(),
            name: "Film retractable".to_string(),
            cost_per_unit: dec!(0.01),
            cost_per_order: dec!(5),
            product_types: vec![ProductType::Flyer],
        }];
        config.offset = ScalarConfig::new(
            "offset",
            [
                scalar("offset", "plate_cost", dec!(9.50)),
                scalar("offset", "calage_base", dec!(40)),
                scalar("offset", "roulage_base_per_1000", dec!(22)),
                scalar("offset", "pages_per_cahier", dec!(16)),
            ],
        );
        config.digital = ScalarConfig::new(
            "digital",
            [
                scalar("digital", "click_price", dec!(0.035)),
                scalar("digital", "setup_cost", dec!(15)),
            ],
        );
        config.margin = ScalarConfig::new(
            "margin",
            [
                scalar("margin", "global_margin_percent", dec!(20)),
                scalar("margin", "material_margin_percent", dec!(10)),
            ],
        );
        config
    }

    fn flyer_input() -> QuoteInput {
        QuoteInput {
            product_type: ProductType::Flyer,
            quantity: 1000,
            format: FormatSpec {
                name: "A5".to_string(),
                width_cm: 15.0,
                height_cm: 10.0,
            },
            open_format: None,
            pages_interior: None,
            pages_cover: 0,
            flap_size_cm: 0.0,
            paper_interior: PaperSelection {
                paper_type_id: "couche_mat".to_string(),
                grammage: 135,
            },
            paper_cover: None,
            color_mode_interior: "quadri".to_string(),
            color_mode_cover: None,
            recto_verso: true,
            binding_type_id: None,
            fold: None,
            secondary_fold: None,
            lamination_mode: None,
            lamination_finish_id: None,
            packaging_option_ids: vec![],
            destinations: vec![],
        }
    }

    // ==================== validation tests ====================

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.quantity = 0;
        let err = validate_input(&config, &input).unwrap_err();
        assert!(matches!(err, PricingError::Validation { .. }));
    }

    #[test]
    fn test_validate_brochure_requires_interior_pages() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.product_type = ProductType::Brochure;
        input.pages_interior = None;
        let err = validate_input(&config, &input).unwrap_err();
        assert!(matches!(err, PricingError::Validation { .. }));
    }

    #[test]
    fn test_validate_fold_count_exceeding_max() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.fold = Some(FoldSelection {
            fold_type_id: "roule".to_string(),
            fold_count: 4,
        });
        let err = validate_input(&config, &input).unwrap_err();
        match err {
            PricingError::Validation { message } => assert!(message.contains("fold count")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_secondary_fold_must_be_allowed() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.fold = Some(FoldSelection {
            fold_type_id: "roule".to_string(),
            fold_count: 2,
        });
        input.secondary_fold = Some(FoldSelection {
            fold_type_id: "roule".to_string(),
            fold_count: 1,
        });
        let err = validate_input(&config, &input).unwrap_err();
        match err {
            PricingError::Validation { message } => assert!(message.contains("secondary")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_packaging_product_type_membership() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.product_type = ProductType::Depliant;
        input.pages_interior = Some(6);
        input.packaging_option_ids = vec!["film".to_string()];
        let err = validate_input(&config, &input).unwrap_err();
        match err {
            PricingError::Validation { message } => assert!(message.contains("film")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_lamination_needs_mode_and_finish() {
        let config = fixture_config(Uuid::nil());
        let mut input = flyer_input();
        input.lamination_mode = Some(LaminationMode::Recto);
        input.lamination_finish_id = None;
        assert!(validate_input(&config, &input).is_err());
    }

    // ==================== orchestration tests ====================

    #[test]
    fn test_evaluate_quote_happy_path() {
        let config = fixture_config(Uuid::nil());
        let response = evaluate_quote(&config, &flyer_input()).unwrap();
        assert!(response.digital_total > Decimal::ZERO);
        assert!(response.offset_total > Decimal::ZERO);
        assert_eq!(response.delivery_cost, Decimal::ZERO);
    }

    #[test]
    fn test_evaluate_quote_error_yields_no_partial_totals() {
        let mut config = fixture_config(Uuid::nil());
        config.click_divisors.clear();
        let result = evaluate_quote(&config, &flyer_input());
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_independence_one_broken_tenant() {
        let healthy_id = Uuid::new_v4();
        let broken_id = Uuid::new_v4();
        let healthy = Tenant {
            id: healthy_id,
            name: "Imprimerie Nord".to_string(),
        };
        let broken = Tenant {
            id: broken_id,
            name: "Imprimerie Sud".to_string(),
        };
        let healthy_config = fixture_config(healthy_id);
        let mut broken_config = fixture_config(broken_id);
        broken_config.click_divisors.clear();

        let input = flyer_input();
        let ok = evaluate_for_tenant(&healthy, &healthy_config, &input);
        let err = evaluate_for_tenant(&broken, &broken_config, &input);

        let ok = ok.expect("healthy tenant should price normally");
        assert_eq!(ok.tenant_name, "Imprimerie Nord");
        assert!(ok.quote.digital_total > Decimal::ZERO);

        let err = err.expect_err("broken tenant should fail");
        assert_eq!(err.tenant_id, broken_id);
        assert_eq!(err.error_type, "configuration_missing");
        assert_eq!(err.message, USER_MESSAGE);
        let details = err.details.expect("details should name the table");
        assert_eq!(details["table"], "pricing_click_divisor");
    }

    #[test]
    fn test_error_details_name_table_and_key() {
        let err = PricingError::missing("pricing_binding_tier_offset", "piqure cahiers=5");
        assert_eq!(err.error_type(), "configuration_missing");
        let details = err.details().unwrap();
        assert_eq!(details["table"], "pricing_binding_tier_offset");
        assert_eq!(details["key"], "piqure cahiers=5");
    }
}
