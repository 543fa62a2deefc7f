//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access. Everything here is
//! a deterministic function of one [`PricingConfig`] snapshot and one
//! [`QuoteInput`]; the same pair always yields bit-identical totals.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use super::models::{
    BindingTierDigital, BindingTierOffset, BindingType, ColorMode, FoldCost, LaminationFinish,
    LaminationMode, LaminationTier, PackagingOption, PaperGrammage, PricingConfig, Process,
    ProductType, ScalarConfig,
};
use super::requests::{DeliveryDestination, FoldSelection, QuoteInput};
use super::responses::CostBreakdown;
use super::services::PricingError;

/// Round a monetary amount to 2 decimal places, half-up.
///
/// Applied as the final step only; intermediate arithmetic stays unrounded.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use printops_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.005)), dec!(2.01));
/// assert_eq!(round_money(dec!(2.004)), dec!(2.00));
/// assert_eq!(round_money(dec!(46.5)), dec!(46.50));
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Find the single tier row matching a predicate.
///
/// Shared by every bracketed/tiered lookup (binding, folding, lamination,
/// delivery) so boundary semantics cannot drift between calculators: first
/// matching row wins, a miss is the caller's `MissingConfiguration`.
pub fn find_tier<T>(rows: &[T], matches: impl Fn(&T) -> bool) -> Option<&T> {
    rows.iter().find(|row| matches(row))
}

/// Number of billed thousands: partial thousands are billed as a full
/// thousand, per print-shop convention
pub fn thousands(quantity: i64) -> i64 {
    (quantity + 999) / 1000
}

// ---------------------------------------------------------------------------
// Imposition
// ---------------------------------------------------------------------------

/// Resolved imposition: the chosen press sheet and how the piece packs on it
#[derive(Debug, Clone)]
pub struct Imposition {
    pub machine_format_name: String,
    /// Finished pieces obtainable from one press sheet
    pub ups: u32,
    /// Piece was rotated 90° on the sheet
    pub rotated: bool,
    pub divisor_recto: Decimal,
    pub divisor_recto_verso: Decimal,
}

impl Imposition {
    pub fn divisor(&self, recto_verso: bool) -> Decimal {
        if recto_verso {
            self.divisor_recto_verso
        } else {
            self.divisor_recto
        }
    }
}

/// Pick the machine format and orientation maximizing ups for a piece.
///
/// Greedy axis-aligned packing, both orientations evaluated. Formats are
/// scanned default-first with strict-max selection, so ties prefer the
/// tenant's default format.
pub fn resolve_imposition(
    config: &PricingConfig,
    piece_width_cm: f64,
    piece_height_cm: f64,
) -> Result<Imposition, PricingError> {
    if piece_width_cm <= 0.0 || piece_height_cm <= 0.0 {
        return Err(PricingError::validation("piece dimensions must be positive"));
    }

    let mut best: Option<(&super::models::MachineFormat, u32, bool)> = None;
    for format in config.machine_formats_default_first() {
        for (w, h, rotated) in [
            (piece_width_cm, piece_height_cm, false),
            (piece_height_cm, piece_width_cm, true),
        ] {
            let ups = ups_on_sheet(format.width_cm, format.height_cm, w, h);
            if ups > 0 && best.map_or(true, |(_, best_ups, _)| ups > best_ups) {
                best = Some((format, ups, rotated));
            }
        }
    }

    let (format, ups, rotated) = best.ok_or_else(|| {
        PricingError::validation(format!(
            "piece {piece_width_cm}x{piece_height_cm} cm does not fit any machine format"
        ))
    })?;

    let divisor = config.click_divisor(&format.name).ok_or_else(|| {
        PricingError::missing("pricing_click_divisor", &format.name)
    })?;

    Ok(Imposition {
        machine_format_name: format.name.clone(),
        ups,
        rotated,
        divisor_recto: divisor.divisor_recto,
        divisor_recto_verso: divisor.divisor_recto_verso,
    })
}

/// Whole pieces per sheet for one orientation: floor(W/w) * floor(H/h)
fn ups_on_sheet(sheet_w: f64, sheet_h: f64, piece_w: f64, piece_h: f64) -> u32 {
    // tolerance for exact fits
    const EPS: f64 = 1e-9;
    let across = ((sheet_w + EPS) / piece_w).floor();
    let down = ((sheet_h + EPS) / piece_h).floor();
    if across < 0.0 || down < 0.0 {
        return 0;
    }
    (across * down) as u32
}

/// Open sheets per finished copy for the interior zone.
///
/// A brochure interior needs one open sheet per `pagesPerOpenSheet` finished
/// pages (4 recto-verso, 2 recto-only); single-leaf products need one.
pub fn sheets_per_copy_interior(
    product: ProductType,
    pages_interior: Option<i32>,
    recto_verso: bool,
) -> u32 {
    match product {
        ProductType::Brochure => {
            let pages = pages_interior.unwrap_or(0).max(0) as u32;
            let per_sheet = if recto_verso { 4 } else { 2 };
            pages.div_ceil(per_sheet).max(1)
        }
        _ => 1,
    }
}

/// Press sheets needed for a zone: ceil(quantity * sheetsPerCopy / ups)
pub fn sheets_needed(quantity: i64, sheets_per_copy: u32, ups: u32) -> i64 {
    let pieces = quantity * i64::from(sheets_per_copy);
    let ups = i64::from(ups);
    (pieces + ups - 1) / ups
}

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

/// Paper cost and weight contribution for one zone
#[derive(Debug, Clone)]
pub struct PaperCost {
    pub cost: Decimal,
    pub weight_per_copy_grams: Decimal,
    pub sheets: i64,
}

/// Cost of `sheets` press sheets of one stock, plus its per-copy weight
/// contribution in grams
pub fn paper_cost(stock: &PaperGrammage, sheets: i64, quantity: i64) -> PaperCost {
    let sheets_dec = Decimal::from(sheets);
    let sheet_weight_grams = stock.weight_per_1000_sheets / Decimal::ONE_THOUSAND;
    let cost = sheets_dec / Decimal::ONE_THOUSAND * sheet_weight_grams * stock.price_per_kg;
    let weight_per_copy_grams = sheets_dec * sheet_weight_grams / Decimal::from(quantity);

    PaperCost {
        cost,
        weight_per_copy_grams,
        sheets,
    }
}

// ---------------------------------------------------------------------------
// Presses
// ---------------------------------------------------------------------------

/// Offset running cost: partial thousands billed as full thousands
pub fn offset_run_cost(roulage_per_1000: Decimal, quantity: i64) -> Decimal {
    roulage_per_1000 * Decimal::from(thousands(quantity))
}

/// Click count for one zone of a digital run
pub fn digital_clicks(sheets: i64, divisor: Decimal, click_multiplier: Decimal) -> Decimal {
    Decimal::from(sheets) * divisor * click_multiplier
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Digital binding cost: unique page-range x quantity-range tier
pub fn binding_cost_digital(
    tiers: &[BindingTierDigital],
    binding_type_code: &str,
    pages_interior: i32,
    quantity: i64,
) -> Result<Decimal, PricingError> {
    let tier = find_tier(tiers, |t| {
        t.binding_type_code == binding_type_code
            && t.page_range_min <= pages_interior
            && pages_interior <= t.page_range_max
            && t.qty_min <= quantity
            && quantity <= t.qty_max
    })
    .ok_or_else(|| {
        PricingError::missing(
            "pricing_binding_tier_digital",
            format!("{binding_type_code} pages={pages_interior} qty={quantity}"),
        )
    })?;

    Ok(tier.per_unit_cost * Decimal::from(quantity) + tier.setup_cost)
}

/// Number of folded sections, the cover counting as one unit
pub fn cahiers_count(pages_interior: i32, pages_cover: i32, pages_per_cahier: i32) -> i32 {
    let interior = (pages_interior + pages_per_cahier - 1) / pages_per_cahier;
    interior + if pages_cover > 0 { 1 } else { 0 }
}

/// Offset binding cost, split into its calage and roulage components
#[derive(Debug, Clone)]
pub struct OffsetBindingCost {
    pub calage: Decimal,
    pub roulage: Decimal,
}

impl OffsetBindingCost {
    pub fn total(&self) -> Decimal {
        self.calage + self.roulage
    }
}

/// Offset binding cost: exact-match tier on cahiers count. No nearest-match
/// fallback - an absent count is a configuration error.
pub fn binding_cost_offset(
    tiers: &[BindingTierOffset],
    binding_type_code: &str,
    cahiers: i32,
    quantity: i64,
) -> Result<OffsetBindingCost, PricingError> {
    let tier = find_tier(tiers, |t| {
        t.binding_type_code == binding_type_code && t.cahiers_count == cahiers
    })
    .ok_or_else(|| {
        PricingError::missing(
            "pricing_binding_tier_offset",
            format!("{binding_type_code} cahiers={cahiers}"),
        )
    })?;

    Ok(OffsetBindingCost {
        calage: tier.calage_cost,
        roulage: offset_run_cost(tier.roulage_per_1000, quantity),
    })
}

// ---------------------------------------------------------------------------
// Folding / lamination / packaging
// ---------------------------------------------------------------------------

/// Cost of one fold operation, by discrete fold count
pub fn folding_cost(
    fold_costs: &[FoldCost],
    fold_type_code: &str,
    num_folds: i32,
) -> Result<Decimal, PricingError> {
    let row = find_tier(fold_costs, |f| {
        f.fold_type_code == fold_type_code && f.num_folds == num_folds
    })
    .ok_or_else(|| {
        PricingError::missing(
            "pricing_fold_cost",
            format!("{fold_type_code} folds={num_folds}"),
        )
    })?;

    Ok(row.cost)
}

/// Total folding cost for the primary and optional secondary fold
pub fn total_folding_cost(
    fold_costs: &[FoldCost],
    fold: Option<&FoldSelection>,
    secondary: Option<&FoldSelection>,
) -> Result<Decimal, PricingError> {
    let mut total = Decimal::ZERO;
    for selection in [fold, secondary].into_iter().flatten() {
        total += folding_cost(fold_costs, &selection.fold_type_id, selection.fold_count)?;
    }
    Ok(total)
}

/// Digital lamination: quantity-tiered price per laminated sheet plus setup
pub fn lamination_cost_digital(
    tiers: &[LaminationTier],
    finish_code: &str,
    quantity: i64,
    laminated_sheets: i64,
    mode: LaminationMode,
) -> Result<Decimal, PricingError> {
    let tier = find_tier(tiers, |t| {
        t.finish_code == finish_code && t.qty_min <= quantity && quantity <= t.qty_max
    })
    .ok_or_else(|| {
        PricingError::missing(
            "pricing_lamination_tier",
            format!("{finish_code} qty={quantity}"),
        )
    })?;

    let sides = lamination_sides(mode);
    Ok(tier.price_per_sheet * Decimal::from(laminated_sheets) * sides + tier.setup_cost)
}

/// Offset lamination: flat per-m2 price plus calage forfait, floored at the
/// finish's minimum billing when present
pub fn lamination_cost_offset(
    finish: &LaminationFinish,
    piece_area_m2: Decimal,
    quantity: i64,
    mode: LaminationMode,
) -> Decimal {
    let area = piece_area_m2 * Decimal::from(quantity) * lamination_sides(mode);
    let cost = finish.offset_price_per_m2 * area + finish.offset_calage_forfait;
    match finish.offset_minimum_billing {
        Some(min) if cost < min => min,
        _ => cost,
    }
}

fn lamination_sides(mode: LaminationMode) -> Decimal {
    match mode {
        LaminationMode::Recto => Decimal::ONE,
        LaminationMode::RectoVerso => Decimal::TWO,
    }
}

/// Packaging cost for one selected option: the per-order term is charged once
/// per option, never per destination
pub fn packaging_cost(option: &PackagingOption, quantity: i64) -> Decimal {
    option.cost_per_unit * Decimal::from(quantity) + option.cost_per_order
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Sum of per-destination carrier prices.
///
/// Each destination resolves its zone's ladder and takes the first bracket
/// whose ceiling is at or above the destination weight.
pub fn delivery_cost(
    config: &PricingConfig,
    destinations: &[DeliveryDestination],
    weight_per_copy_grams: Decimal,
) -> Result<Decimal, PricingError> {
    let mut total = Decimal::ZERO;
    for destination in destinations {
        let weight_kg =
            weight_per_copy_grams * Decimal::from(destination.quantity) / Decimal::ONE_THOUSAND;
        let ladder = config.delivery_ladder(&destination.zone);
        let bracket = ladder
            .iter()
            .find(|rate| rate.max_weight_kg >= weight_kg)
            .ok_or_else(|| {
                PricingError::missing(
                    "pricing_delivery_rate",
                    format!("zone={} weight_kg={}", destination.zone, round_money(weight_kg)),
                )
            })?;
        total += bracket.price;
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Margin & assembly
// ---------------------------------------------------------------------------

fn require_scalar(config: &ScalarConfig, key: &str) -> Result<Decimal, PricingError> {
    config.get(key).ok_or_else(|| {
        PricingError::missing(format!("pricing_scalar_config[{}]", config.domain), key)
    })
}

/// Raw (unrounded) cost lines for one process, before margin
#[derive(Debug, Clone, Default)]
struct RawLines {
    paper: Decimal,
    plates: Decimal,
    calage: Decimal,
    roulage: Decimal,
    clicks: Decimal,
    setup: Decimal,
    binding: Decimal,
    folding: Decimal,
    lamination: Decimal,
    packaging: Decimal,
}

/// Apply margin and round every line half-up to 2 decimals, as the final step
fn assemble_breakdown(lines: RawLines, margin_config: &ScalarConfig) -> Result<CostBreakdown, PricingError> {
    let global_percent = require_scalar(margin_config, "global_margin_percent")?;
    let material_percent = require_scalar(margin_config, "material_margin_percent")?;

    let subtotal = lines.paper
        + lines.plates
        + lines.calage
        + lines.roulage
        + lines.clicks
        + lines.setup
        + lines.binding
        + lines.folding
        + lines.lamination
        + lines.packaging;
    let margin = subtotal * global_percent / Decimal::ONE_HUNDRED
        + lines.paper * material_percent / Decimal::ONE_HUNDRED;
    let total = subtotal + margin;

    Ok(CostBreakdown {
        paper: round_money(lines.paper),
        plates: round_money(lines.plates),
        calage: round_money(lines.calage),
        roulage: round_money(lines.roulage),
        clicks: round_money(lines.clicks),
        setup: round_money(lines.setup),
        binding: round_money(lines.binding),
        folding: round_money(lines.folding),
        lamination: round_money(lines.lamination),
        packaging: round_money(lines.packaging),
        subtotal: round_money(subtotal),
        margin: round_money(margin),
        total: round_money(total),
    })
}

// ---------------------------------------------------------------------------
// Dual-process pipeline
// ---------------------------------------------------------------------------

/// Process-independent intermediates shared by both pricing passes
struct ProcessContext<'a> {
    quantity: i64,
    recto_verso: bool,
    pages_interior: i32,
    pages_cover: i32,
    layout_width_cm: f64,
    layout_height_cm: f64,
    interior_imposition: &'a Imposition,
    cover_imposition: Option<&'a Imposition>,
    interior_sheets: i64,
    cover_sheets: Option<i64>,
    interior_color: &'a ColorMode,
    cover_color: Option<&'a ColorMode>,
    binding_type: Option<&'a BindingType>,
    lamination: Option<(LaminationMode, &'a LaminationFinish)>,
    paper_total: Decimal,
    folding_total: Decimal,
    packaging_total: Decimal,
}

/// Price one process from the shared context.
///
/// Paper, folding and packaging enter identically for both processes; the
/// press, binding and lamination lines are the only process-specific parts.
fn price_process(
    process: Process,
    config: &PricingConfig,
    ctx: &ProcessContext<'_>,
) -> Result<CostBreakdown, PricingError> {
    let mut lines = RawLines {
        paper: ctx.paper_total,
        folding: ctx.folding_total,
        packaging: ctx.packaging_total,
        ..RawLines::default()
    };

    match process {
        Process::Digital => {
            let mut clicks = digital_clicks(
                ctx.interior_sheets,
                ctx.interior_imposition.divisor(ctx.recto_verso),
                ctx.interior_color.click_multiplier,
            );
            if let (Some(imposition), Some(sheets), Some(color)) =
                (ctx.cover_imposition, ctx.cover_sheets, ctx.cover_color)
            {
                clicks +=
                    digital_clicks(sheets, imposition.divisor(ctx.recto_verso), color.click_multiplier);
            }
            lines.clicks = clicks * require_scalar(&config.digital, "click_price")?;
            lines.setup = require_scalar(&config.digital, "setup_cost")?;

            if let Some(binding) = ctx.binding_type {
                lines.binding = binding_cost_digital(
                    &config.binding_tiers_digital,
                    &binding.code,
                    ctx.pages_interior,
                    ctx.quantity,
                )?;
            }

            if let Some((mode, finish)) = ctx.lamination {
                lines.lamination = lamination_cost_digital(
                    &config.lamination_tiers,
                    &finish.code,
                    ctx.quantity,
                    ctx.cover_sheets.unwrap_or(ctx.interior_sheets),
                    mode,
                )?;
            }
        }
        Process::Offset => {
            let sides = if ctx.recto_verso { 2 } else { 1 };
            let plate_unit_cost = require_scalar(&config.offset, "plate_cost")?;
            let plate_count = (ctx.interior_color.plates_per_side
                + ctx.cover_color.map_or(0, |c| c.plates_per_side))
                * sides;
            lines.plates = Decimal::from(plate_count) * plate_unit_cost;

            // For bound work the press make-ready and running costs come from
            // the binding's offset tier; unbound work pays the base scalars
            (lines.calage, lines.roulage) = match ctx.binding_type {
                Some(binding) => {
                    let pages_per_cahier = require_scalar(&config.offset, "pages_per_cahier")?
                        .to_i32()
                        .filter(|p| *p > 0)
                        .ok_or_else(|| {
                            PricingError::validation("pages_per_cahier must be a positive integer")
                        })?;
                    let cahiers =
                        cahiers_count(ctx.pages_interior, ctx.pages_cover, pages_per_cahier);
                    let cost = binding_cost_offset(
                        &config.binding_tiers_offset,
                        &binding.code,
                        cahiers,
                        ctx.quantity,
                    )?;
                    (cost.calage, cost.roulage)
                }
                None => {
                    let calage = require_scalar(&config.offset, "calage_base")?;
                    let roulage_per_1000 =
                        require_scalar(&config.offset, "roulage_base_per_1000")?;
                    (calage, offset_run_cost(roulage_per_1000, ctx.quantity))
                }
            };

            if let Some((mode, finish)) = ctx.lamination {
                let area = piece_area_m2(ctx.layout_width_cm, ctx.layout_height_cm)?;
                lines.lamination = lamination_cost_offset(finish, area, ctx.quantity, mode);
            }
        }
    }

    assemble_breakdown(lines, &config.margin)
}

/// Result of pricing one input for both processes
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub digital_total: Decimal,
    pub offset_total: Decimal,
    pub digital_breakdown: CostBreakdown,
    pub offset_breakdown: CostBreakdown,
    pub delivery_cost: Decimal,
    pub weight_per_copy_grams: Decimal,
}

/// Price one validated input against one tenant's configuration snapshot.
///
/// Imposition resolves first (every sheet-based calculator depends on it),
/// the component calculators follow, delivery prices the aggregate weight,
/// margin and assembly run last. Any error aborts the whole calculation -
/// partial prices are never returned.
pub fn compute_quote(
    config: &PricingConfig,
    input: &QuoteInput,
) -> Result<QuoteOutcome, PricingError> {
    let quantity = input.quantity;
    let layout = input.layout_format();

    let interior_imposition = resolve_imposition(config, layout.width_cm, layout.height_cm)?;
    let has_cover = input.pages_cover > 0;
    let cover_imposition = if has_cover {
        if input.flap_size_cm > 0.0 {
            Some(resolve_imposition(
                config,
                layout.width_cm + input.flap_size_cm,
                layout.height_cm,
            )?)
        } else {
            Some(interior_imposition.clone())
        }
    } else {
        None
    };

    let interior_sheets = sheets_needed(
        quantity,
        sheets_per_copy_interior(input.product_type, input.pages_interior, input.recto_verso),
        interior_imposition.ups,
    );
    let cover_sheets = cover_imposition
        .as_ref()
        .map(|imposition| sheets_needed(quantity, 1, imposition.ups));

    // Paper stocks, with dos carre compatibility checked against the binding
    let binding_type = input
        .binding_type_id
        .as_deref()
        .map(|code| {
            config
                .binding_type(code)
                .ok_or_else(|| PricingError::missing("pricing_binding_type", code))
        })
        .transpose()?;

    let interior_stock = lookup_stock(config, &input.paper_interior)?;
    let cover_stock = match (&input.paper_cover, has_cover) {
        (Some(selection), true) => Some(lookup_stock(config, selection)?),
        _ => None,
    };
    if let Some(binding) = binding_type {
        if binding.is_dos_carre {
            for stock in [Some(interior_stock), cover_stock].into_iter().flatten() {
                if !stock.available_for_dos_carre {
                    return Err(PricingError::validation(format!(
                        "paper {} {}g is not available for dos carre binding",
                        stock.paper_type_code, stock.grammage
                    )));
                }
            }
        }
    }

    let interior_paper = paper_cost(interior_stock, interior_sheets, quantity);
    let cover_paper = cover_stock
        .zip(cover_sheets)
        .map(|(stock, sheets)| paper_cost(stock, sheets, quantity));

    let paper_total =
        interior_paper.cost + cover_paper.as_ref().map_or(Decimal::ZERO, |p| p.cost);
    let weight_per_copy_grams = interior_paper.weight_per_copy_grams
        + cover_paper
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.weight_per_copy_grams);

    // Color modes
    let interior_color = config
        .color_mode(&input.color_mode_interior)
        .ok_or_else(|| PricingError::missing("pricing_color_mode", &input.color_mode_interior))?;
    let cover_color = match (&input.color_mode_cover, has_cover) {
        (Some(code), true) => Some(
            config
                .color_mode(code)
                .ok_or_else(|| PricingError::missing("pricing_color_mode", code))?,
        ),
        _ => None,
    };

    // Finishing shared by both processes
    let folding_total = total_folding_cost(
        &config.fold_costs,
        input.fold.as_ref(),
        input.secondary_fold.as_ref(),
    )?;

    let mut packaging_total = Decimal::ZERO;
    for code in &input.packaging_option_ids {
        let option = config
            .packaging_option(code)
            .ok_or_else(|| PricingError::missing("pricing_packaging_option", code))?;
        packaging_total += packaging_cost(option, quantity);
    }

    let lamination = match (input.lamination_mode, input.lamination_finish_id.as_deref()) {
        (Some(mode), Some(code)) => {
            let finish = config
                .lamination_finish(code)
                .ok_or_else(|| PricingError::missing("pricing_lamination_finish", code))?;
            Some((mode, finish))
        }
        _ => None,
    };

    // One pipeline, parameterized by process, invoked twice - the two totals
    // cannot drift apart structurally
    let ctx = ProcessContext {
        quantity,
        recto_verso: input.recto_verso,
        pages_interior: input.pages_interior.unwrap_or(0),
        pages_cover: input.pages_cover,
        layout_width_cm: layout.width_cm,
        layout_height_cm: layout.height_cm,
        interior_imposition: &interior_imposition,
        cover_imposition: cover_imposition.as_ref(),
        interior_sheets,
        cover_sheets,
        interior_color,
        cover_color,
        binding_type,
        lamination,
        paper_total,
        folding_total,
        packaging_total,
    };
    let digital_breakdown = price_process(Process::Digital, config, &ctx)?;
    let offset_breakdown = price_process(Process::Offset, config, &ctx)?;

    // Delivery prices the aggregate paper weight and is never margined
    let delivery = delivery_cost(config, &input.destinations, weight_per_copy_grams)?;

    Ok(QuoteOutcome {
        digital_total: digital_breakdown.total,
        offset_total: offset_breakdown.total,
        digital_breakdown,
        offset_breakdown,
        delivery_cost: round_money(delivery),
        weight_per_copy_grams: round_money(weight_per_copy_grams),
    })
}

fn lookup_stock<'a>(
    config: &'a PricingConfig,
    selection: &super::requests::PaperSelection,
) -> Result<&'a PaperGrammage, PricingError> {
    config
        .paper_grammage(&selection.paper_type_id, selection.grammage)
        .ok_or_else(|| {
            PricingError::missing(
                "pricing_paper_grammage",
                format!("{} {}g", selection.paper_type_id, selection.grammage),
            )
        })
}

fn piece_area_m2(width_cm: f64, height_cm: f64) -> Result<Decimal, PricingError> {
    Decimal::from_f64(width_cm * height_cm / 10_000.0)
        .ok_or_else(|| PricingError::validation("piece dimensions out of range"))
}
