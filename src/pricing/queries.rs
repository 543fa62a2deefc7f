//! Database queries for the pricing engine.
//!
//! Each loader reads both the tenant-scoped and the tenant-less default rows
//! of one table in a single query, then layers them in memory: a tenant row
//! overrides the default row of the same logical key, and defaults are never
//! mutated. Tier tables layer per parent group (binding type, fold type,
//! finish, zone) - if a tenant defines any rows for a group, its set replaces
//! the default set wholesale, so the exhaustive-range invariant of a group
//! cannot be broken by mixing layers.

use std::collections::HashSet;
use std::hash::Hash;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{
    BindingTierDigital, BindingTierOffset, BindingType, ClickDivisor, ColorMode, DeliveryRate,
    FoldCost, FoldType, LaminationFinish, LaminationTier, MachineFormat, PackagingOption,
    PackagingOptionRow, PaperGrammage, PricingConfig, ScalarConfig, ScalarRow, Tenant,
};

/// Keep tenant rows, and default rows whose key no tenant row claims
fn layer<T, K>(rows: Vec<T>, tenant_of: impl Fn(&T) -> Option<Uuid>, key_of: impl Fn(&T) -> K) -> Vec<T>
where
    K: Eq + Hash,
{
    let claimed: HashSet<K> = rows
        .iter()
        .filter(|row| tenant_of(row).is_some())
        .map(&key_of)
        .collect();

    rows.into_iter()
        .filter(|row| tenant_of(row).is_some() || !claimed.contains(&key_of(row)))
        .collect()
}

pub async fn load_paper_grammages(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<PaperGrammage>, AppError> {
    let rows = sqlx::query_as::<_, PaperGrammage>(
        r#"
        SELECT tenant_id, paper_type_code, grammage, weight_per_1000_sheets,
               price_per_kg, available_for_dos_carre
        FROM pricing_paper_grammage
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY paper_type_code, grammage
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(
        rows,
        |r| r.tenant_id,
        |r| (r.paper_type_code.clone(), r.grammage),
    ))
}

pub async fn load_color_modes(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<ColorMode>, AppError> {
    let rows = sqlx::query_as::<_, ColorMode>(
        r#"
        SELECT tenant_id, code, name, plates_per_side, click_multiplier
        FROM pricing_color_mode
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY code
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.code.clone()))
}

pub async fn load_binding_types(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<BindingType>, AppError> {
    let rows = sqlx::query_as::<_, BindingType>(
        r#"
        SELECT tenant_id, code, name, is_dos_carre
        FROM pricing_binding_type
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY code
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.code.clone()))
}

pub async fn load_binding_tiers_digital(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<BindingTierDigital>, AppError> {
    let rows = sqlx::query_as::<_, BindingTierDigital>(
        r#"
        SELECT tenant_id, binding_type_code, page_range_min, page_range_max,
               qty_min, qty_max, per_unit_cost, setup_cost
        FROM pricing_binding_tier_digital
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY binding_type_code, page_range_min, qty_min
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    // group-level layering: a tenant's tier set replaces the default set
    Ok(layer(rows, |r| r.tenant_id, |r| r.binding_type_code.clone()))
}

pub async fn load_binding_tiers_offset(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<BindingTierOffset>, AppError> {
    let rows = sqlx::query_as::<_, BindingTierOffset>(
        r#"
        SELECT tenant_id, binding_type_code, cahiers_count, calage_cost, roulage_per_1000
        FROM pricing_binding_tier_offset
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY binding_type_code, cahiers_count
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.binding_type_code.clone()))
}

pub async fn load_fold_types(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<FoldType>, AppError> {
    let rows = sqlx::query_as::<_, FoldType>(
        r#"
        SELECT tenant_id, code, name, max_folds, can_be_secondary
        FROM pricing_fold_type
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY code
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.code.clone()))
}

pub async fn load_fold_costs(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<FoldCost>, AppError> {
    let rows = sqlx::query_as::<_, FoldCost>(
        r#"
        SELECT tenant_id, fold_type_code, num_folds, cost
        FROM pricing_fold_cost
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY fold_type_code, num_folds
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.fold_type_code.clone()))
}

pub async fn load_lamination_finishes(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<LaminationFinish>, AppError> {
    let rows = sqlx::query_as::<_, LaminationFinish>(
        r#"
        SELECT tenant_id, code, name, offset_price_per_m2, offset_calage_forfait,
               offset_minimum_billing
        FROM pricing_lamination_finish
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY code
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.code.clone()))
}

pub async fn load_lamination_tiers(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<LaminationTier>, AppError> {
    let rows = sqlx::query_as::<_, LaminationTier>(
        r#"
        SELECT tenant_id, finish_code, qty_min, qty_max, price_per_sheet, setup_cost
        FROM pricing_lamination_tier
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY finish_code, qty_min
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.finish_code.clone()))
}

pub async fn load_packaging_options(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<PackagingOption>, AppError> {
    let rows = sqlx::query_as::<_, PackagingOptionRow>(
        r#"
        SELECT tenant_id, code, name, cost_per_unit, cost_per_order, product_types
        FROM pricing_packaging_option
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY code
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    let layered = layer(rows, |r| r.tenant_id, |r| r.code.clone());

    // Unknown product-type tags are a configuration-load error, not a
    // silently ignored association
    layered
        .into_iter()
        .map(|row| PackagingOption::try_from(row).map_err(AppError::Internal))
        .collect()
}

pub async fn load_delivery_rates(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<DeliveryRate>, AppError> {
    let rows = sqlx::query_as::<_, DeliveryRate>(
        r#"
        SELECT tenant_id, carrier, zone, max_weight_kg, price
        FROM pricing_delivery_rate
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY zone, max_weight_kg
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.zone.clone()))
}

pub async fn load_machine_formats(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<MachineFormat>, AppError> {
    let rows = sqlx::query_as::<_, MachineFormat>(
        r#"
        SELECT tenant_id, name, width_cm, height_cm, is_default
        FROM pricing_machine_format
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY name
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.name.clone()))
}

pub async fn load_click_divisors(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<ClickDivisor>, AppError> {
    let rows = sqlx::query_as::<_, ClickDivisor>(
        r#"
        SELECT tenant_id, format_name, divisor_recto, divisor_recto_verso
        FROM pricing_click_divisor
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND deleted_at IS NULL
        ORDER BY format_name
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(rows, |r| r.tenant_id, |r| r.format_name.clone()))
}

pub async fn load_scalars(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<ScalarRow>, AppError> {
    let rows = sqlx::query_as::<_, ScalarRow>(
        r#"
        SELECT tenant_id, domain, key, value, unit
        FROM pricing_scalar_config
        WHERE (tenant_id = $1 OR tenant_id IS NULL)
          AND domain IN ('offset', 'digital', 'margin')
          AND deleted_at IS NULL
        ORDER BY domain, key
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(layer(
        rows,
        |r| r.tenant_id,
        |r| (r.domain.clone(), r.key.clone()),
    ))
}

/// Get a tenant directory row by id
pub async fn get_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        SELECT id, name
        FROM printops_tenant
        WHERE id = $1
          AND deleted_at IS NULL
        "#,
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;

    Ok(tenant)
}

/// Load and resolve every configuration table into one immutable snapshot
pub async fn load_pricing_config(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<PricingConfig, AppError> {
    let scalars = load_scalars(pool, tenant_id).await?;
    let (mut offset, mut digital, mut margin) = (Vec::new(), Vec::new(), Vec::new());
    for row in scalars {
        match row.domain.as_str() {
            "offset" => offset.push(row),
            "digital" => digital.push(row),
            "margin" => margin.push(row),
            _ => {}
        }
    }

    Ok(PricingConfig {
        tenant_id,
        paper_grammages: load_paper_grammages(pool, tenant_id).await?,
        color_modes: load_color_modes(pool, tenant_id).await?,
        binding_types: load_binding_types(pool, tenant_id).await?,
        binding_tiers_digital: load_binding_tiers_digital(pool, tenant_id).await?,
        binding_tiers_offset: load_binding_tiers_offset(pool, tenant_id).await?,
        fold_types: load_fold_types(pool, tenant_id).await?,
        fold_costs: load_fold_costs(pool, tenant_id).await?,
        lamination_finishes: load_lamination_finishes(pool, tenant_id).await?,
        lamination_tiers: load_lamination_tiers(pool, tenant_id).await?,
        packaging_options: load_packaging_options(pool, tenant_id).await?,
        delivery_rates: load_delivery_rates(pool, tenant_id).await?,
        machine_formats: load_machine_formats(pool, tenant_id).await?,
        click_divisors: load_click_divisors(pool, tenant_id).await?,
        offset: ScalarConfig::new("offset", offset),
        digital: ScalarConfig::new("digital", digital),
        margin: ScalarConfig::new("margin", margin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        tenant_id: Option<Uuid>,
        code: &'static str,
        value: i32,
    }

    fn row(tenant_id: Option<Uuid>, code: &'static str, value: i32) -> Row {
        Row {
            tenant_id,
            code,
            value,
        }
    }

    #[test]
    fn test_layer_tenant_row_overrides_default() {
        let tenant = Uuid::new_v4();
        let rows = vec![
            row(None, "quadri", 4),
            row(Some(tenant), "quadri", 5),
            row(None, "noir", 1),
        ];
        let layered = layer(rows, |r| r.tenant_id, |r| r.code);
        assert_eq!(layered.len(), 2);
        assert!(layered.contains(&row(Some(tenant), "quadri", 5)));
        assert!(layered.contains(&row(None, "noir", 1)));
    }

    #[test]
    fn test_layer_group_replacement_is_wholesale() {
        let tenant = Uuid::new_v4();
        // default group has two tiers, tenant redefines the group with one
        let rows = vec![
            row(None, "piqure", 1),
            row(None, "piqure", 2),
            row(Some(tenant), "piqure", 9),
        ];
        let layered = layer(rows, |r| r.tenant_id, |r| r.code);
        assert_eq!(layered, vec![row(Some(tenant), "piqure", 9)]);
    }

    #[test]
    fn test_layer_defaults_pass_through_untouched() {
        let rows = vec![row(None, "a", 1), row(None, "b", 2)];
        let layered = layer(rows, |r| r.tenant_id, |r| r.code);
        assert_eq!(layered.len(), 2);
    }
}
