use crate::core::catalog::AnodeCatalog;
use crate::core::rates::{estimate_growth, RateCard};
use crate::domain::model::{
    AnodeLine, GrowthInput, HullType, Quote, QuoteInput, ServiceKind, SurchargeKind,
    SurchargeLine,
};
use crate::utils::error::{QuoteError, Result};
use crate::utils::money::format_usd;
use rust_decimal::Decimal;

/// Prices a `QuoteInput` against a `RateCard`.
///
/// Surcharge percentages are summed and applied once to the base price,
/// so a 55 ft catamaran with twin engines is `base × 1.35`, not
/// `base × 1.25 × 1.10`. Anode parts and per-unit labor are added after
/// surcharges. Nothing is rounded here; flows round the charge amount
/// with their own `RoundingPolicy`.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rates: RateCard,
}

impl PricingEngine {
    pub fn new(rates: RateCard) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateCard {
        &self.rates
    }

    pub fn calculate(&self, input: &QuoteInput, catalog: &AnodeCatalog) -> Result<Quote> {
        let service = self.rates.service(input.service)?;

        let (base_price, boat_length_ft) = match service.kind {
            ServiceKind::PerFoot => {
                let length = input
                    .boat_length_ft
                    .ok_or_else(|| {
                        QuoteError::validation(
                            "boat_length_ft",
                            format!("boat length is required for {}", service.name),
                        )
                    })?;
                if length <= Decimal::ZERO {
                    return Err(QuoteError::validation(
                        "boat_length_ft",
                        format!("boat length must be positive, got {}", length),
                    ));
                }
                let base = service.rate.checked_mul(length);
                (too_large(base, "boat_length_ft")?, Some(length))
            }
            ServiceKind::Flat => {
                if input.units == 0 {
                    return Err(QuoteError::validation("units", "at least one unit is required"));
                }
                let base = service.rate.checked_mul(Decimal::from(input.units));
                (too_large(base, "units")?, input.boat_length_ft)
            }
        };

        let mut applied = Vec::new();
        let mut push = |kind: SurchargeKind, label: String, percent: Decimal| {
            if percent > Decimal::ZERO {
                applied.push((kind, label, percent));
            }
        };

        if service.kind == ServiceKind::PerFoot {
            let s = &self.rates.surcharges;
            match input.hull_type {
                HullType::Monohull => {}
                HullType::Catamaran => {
                    push(SurchargeKind::Hull, "Catamaran".to_string(), s.catamaran)
                }
                HullType::Trimaran => push(SurchargeKind::Hull, "Trimaran".to_string(), s.trimaran),
            }
            if input.is_powerboat {
                push(SurchargeKind::Powerboat, "Powerboat".to_string(), s.powerboat);
            }
            if input.has_twin_engines {
                push(SurchargeKind::TwinEngines, "Twin Engines".to_string(), s.twin_engines);
            }
        }

        let mut paint_condition = input.paint_condition;
        let mut growth_label = None;
        if input.service.is_cleaning() {
            let (label, percent) = match input.growth {
                GrowthInput::Slider(position) => {
                    let band = self.rates.growth_band(position)?;
                    (band.label.clone(), band.percent)
                }
                GrowthInput::Level(level) => {
                    (level.to_string(), self.rates.growth_level_percent(level))
                }
                GrowthInput::Estimated(history) => {
                    let estimate = estimate_growth(history);
                    paint_condition = estimate.paint;
                    (format!("Est. {}", estimate.level), estimate.percent)
                }
            };
            push(SurchargeKind::Growth, format!("Growth ({})", label), percent);
            growth_label = Some(label);
        }

        let mut surcharges = Vec::with_capacity(applied.len());
        for (kind, label, percent) in applied {
            let amount = base_price
                .checked_mul(percent)
                .map(|scaled| scaled / Decimal::ONE_HUNDRED);
            surcharges.push(SurchargeLine {
                kind,
                label,
                percent,
                amount: too_large(amount, "boat_length_ft")?,
            });
        }

        let surcharge_percent: Decimal = surcharges.iter().map(|s| s.percent).sum();
        let multiplier = Decimal::ONE + surcharge_percent / Decimal::ONE_HUNDRED;
        let service_total = too_large(base_price.checked_mul(multiplier), "boat_length_ft")?;

        let mut anode_lines = Vec::new();
        for (id, quantity) in &input.anode_selections {
            if *quantity == 0 {
                continue;
            }
            let anode = catalog.require(id)?;
            anode_lines.push(AnodeLine {
                id: anode.id.clone(),
                name: anode.name.clone(),
                unit_price: anode.list_price,
                quantity: *quantity,
                amount: too_large(
                    anode.list_price.checked_mul(Decimal::from(*quantity)),
                    "anode_selections",
                )?,
            });
        }
        let anode_subtotal = anode_lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, l| sum.checked_add(l.amount));
        let anode_subtotal = too_large(anode_subtotal, "anode_selections")?;
        let anode_count = anode_lines
            .iter()
            .try_fold(0u32, |count, l| count.checked_add(l.quantity))
            .ok_or_else(|| QuoteError::validation("anode_selections", "too many anodes"))?;
        let labor_cost = too_large(
            self.rates
                .anode_labor_per_unit
                .checked_mul(Decimal::from(anode_count)),
            "anode_selections",
        )?;

        let subtotal = service_total
            .checked_add(anode_subtotal)
            .and_then(|sum| sum.checked_add(labor_cost));
        let subtotal = too_large(subtotal, "anode_selections")?;
        let minimum = self.rates.minimum_charge;
        let (total, minimum_applied) = if subtotal > Decimal::ZERO && subtotal < minimum {
            (minimum, true)
        } else {
            (subtotal, false)
        };

        tracing::debug!(
            service = %input.service,
            %base_price,
            %surcharge_percent,
            %anode_subtotal,
            %labor_cost,
            %total,
            "Calculated quote"
        );

        Ok(Quote {
            service: input.service,
            service_name: service.name.clone(),
            service_kind: service.kind,
            rate: service.rate,
            boat_length_ft,
            base_price,
            surcharges,
            service_total,
            anode_lines,
            anode_subtotal,
            labor_cost,
            subtotal,
            total,
            minimum_applied,
            paint_condition,
            growth_label,
        })
    }

    /// Human readable breakdown, one line per item.
    pub fn breakdown_lines(&self, quote: &Quote, is_estimate: bool) -> Vec<String> {
        let mut lines = Vec::new();

        match (quote.service_kind, quote.boat_length_ft) {
            (ServiceKind::PerFoot, Some(length)) => lines.push(format!(
                "• Base ({}/ft × {}ft): {}",
                format_usd(quote.rate),
                length.normalize(),
                format_usd(quote.base_price)
            )),
            _ => lines.push(format!("• Flat Rate: {}", format_usd(quote.base_price))),
        }

        for surcharge in &quote.surcharges {
            lines.push(format!(
                "  • {} (+{}%): {}",
                surcharge.label,
                surcharge.percent.normalize(),
                format_usd(surcharge.amount)
            ));
        }

        for anode in &quote.anode_lines {
            lines.push(format!(
                "• {} × {} @ {}: {}",
                anode.quantity,
                anode.name,
                format_usd(anode.unit_price),
                format_usd(anode.amount)
            ));
        }
        if quote.labor_cost > Decimal::ZERO {
            lines.push(format!(
                "• Anode Installation ({} @ {} each): {}",
                quote.anode_count(),
                format_usd(self.rates.anode_labor_per_unit),
                format_usd(quote.labor_cost)
            ));
        }

        lines.push(format!("Subtotal: {}", format_usd(quote.subtotal)));
        if quote.minimum_applied {
            lines.push(format!(
                "Applied Minimum Charge: {}",
                format_usd(self.rates.minimum_charge)
            ));
        }
        let label = if is_estimate { "Total Estimate" } else { "Total" };
        lines.push(format!("{}: {}", label, format_usd(quote.total)));

        lines
    }
}

/// Maps an overflowed money calculation to a validation error on `field`.
fn too_large(amount: Option<Decimal>, field: &str) -> Result<Decimal> {
    amount.ok_or_else(|| QuoteError::validation(field, "value is too large to price"))
}
