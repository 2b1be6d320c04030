//! Business numbers behind every quote: service rates, surcharge tiers,
//! growth bands, anode labor and the minimum charge.
//!
//! Defaults match the published price list; every value can be
//! overridden from the `[rates]`, `[surcharges]`, `[growth]` and
//! `[anodes]` sections of the TOML config.

use crate::domain::model::{
    CleanedAge, CleaningHistory, GrowthLevel, PaintAge, PaintCondition, ServiceKey, ServiceKind,
};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{validate_non_negative_amount, validate_positive_amount, Validate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRate {
    pub name: String,
    pub kind: ServiceKind,
    /// Dollars per foot for `per_foot`, dollars per unit for `flat`.
    pub rate: Decimal,
}

/// Whole-percent surcharges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurchargeRates {
    pub catamaran: Decimal,
    pub trimaran: Decimal,
    pub powerboat: Decimal,
    pub twin_engines: Decimal,
    pub growth_heavy: Decimal,
    pub growth_severe: Decimal,
}

impl Default for SurchargeRates {
    fn default() -> Self {
        Self {
            catamaran: dec!(25),
            trimaran: dec!(50),
            powerboat: dec!(25),
            twin_engines: dec!(10),
            growth_heavy: dec!(35),
            growth_severe: dec!(200),
        }
    }
}

/// Slider positions up to and including `upto` carry `percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthBand {
    pub upto: u8,
    pub label: String,
    pub percent: Decimal,
}

impl GrowthBand {
    fn new(upto: u8, label: &str, percent: Decimal) -> Self {
        Self {
            upto,
            label: label.to_string(),
            percent,
        }
    }
}

pub fn default_growth_bands() -> Vec<GrowthBand> {
    vec![
        GrowthBand::new(20, "Minimal", dec!(0)),
        GrowthBand::new(59, "Moderate", dec!(0)),
        GrowthBand::new(64, "Heavy", dec!(35)),
        GrowthBand::new(74, "Very Heavy", dec!(75)),
        GrowthBand::new(84, "Severe", dec!(100)),
        GrowthBand::new(94, "Very Severe", dec!(150)),
        GrowthBand::new(100, "Extreme", dec!(200)),
    ]
}

pub fn default_services() -> BTreeMap<ServiceKey, ServiceRate> {
    let service = |name: &str, kind, rate| ServiceRate {
        name: name.to_string(),
        kind,
        rate,
    };

    BTreeMap::from([
        (
            ServiceKey::RecurringCleaning,
            service("Recurring Cleaning & Anodes", ServiceKind::PerFoot, dec!(4.50)),
        ),
        (
            ServiceKey::OnetimeCleaning,
            service("One-time Cleaning & Anodes", ServiceKind::PerFoot, dec!(6.00)),
        ),
        (
            ServiceKey::UnderwaterInspection,
            service("Underwater Inspection", ServiceKind::PerFoot, dec!(4)),
        ),
        (
            ServiceKey::ItemRecovery,
            service("Item Recovery", ServiceKind::Flat, dec!(199)),
        ),
        (
            ServiceKey::PropellerService,
            service("Propeller Removal/Installation", ServiceKind::Flat, dec!(349)),
        ),
        (
            ServiceKey::AnodesOnly,
            service("Anodes Only", ServiceKind::Flat, dec!(150)),
        ),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateCard {
    pub services: BTreeMap<ServiceKey, ServiceRate>,
    pub surcharges: SurchargeRates,
    pub growth_bands: Vec<GrowthBand>,
    pub anode_labor_per_unit: Decimal,
    pub minimum_charge: Decimal,
}

impl Default for RateCard {
    fn default() -> Self {
        Self {
            services: default_services(),
            surcharges: SurchargeRates::default(),
            growth_bands: default_growth_bands(),
            anode_labor_per_unit: dec!(15),
            minimum_charge: dec!(150),
        }
    }
}

impl RateCard {
    pub fn service(&self, key: ServiceKey) -> Result<&ServiceRate> {
        self.services
            .get(&key)
            .ok_or_else(|| QuoteError::UnknownService {
                key: key.as_str().to_string(),
            })
    }

    /// Looks a service up by its display name, as the checkout form sends it.
    pub fn service_by_name(&self, name: &str) -> Option<(ServiceKey, &ServiceRate)> {
        self.services
            .iter()
            .find(|(_, rate)| rate.name == name)
            .map(|(key, rate)| (*key, rate))
    }

    pub fn growth_band(&self, slider: u8) -> Result<&GrowthBand> {
        if slider > 100 {
            return Err(QuoteError::validation(
                "growth",
                format!("slider position {} is outside 0-100", slider),
            ));
        }
        self.growth_bands
            .iter()
            .find(|band| slider <= band.upto)
            .ok_or_else(|| QuoteError::ConfigValidationError {
                field: "growth.bands".to_string(),
                message: format!("no band covers slider position {}", slider),
            })
    }

    /// Surcharge for a diver-reported growth level.
    pub fn growth_level_percent(&self, level: GrowthLevel) -> Decimal {
        match level {
            GrowthLevel::Minimal | GrowthLevel::Moderate => Decimal::ZERO,
            GrowthLevel::Heavy => self.surcharges.growth_heavy,
            GrowthLevel::Severe => self.surcharges.growth_severe,
        }
    }
}

impl Validate for RateCard {
    fn validate(&self) -> Result<()> {
        for (key, service) in &self.services {
            validate_positive_amount(&format!("rates.{}", key), service.rate)?;
        }

        let s = &self.surcharges;
        for (field, value) in [
            ("surcharges.catamaran", s.catamaran),
            ("surcharges.trimaran", s.trimaran),
            ("surcharges.powerboat", s.powerboat),
            ("surcharges.twin_engines", s.twin_engines),
            ("surcharges.growth_heavy", s.growth_heavy),
            ("surcharges.growth_severe", s.growth_severe),
        ] {
            validate_non_negative_amount(field, value)?;
        }

        validate_non_negative_amount("anodes.labor_per_unit", self.anode_labor_per_unit)?;
        validate_non_negative_amount("minimum_charge", self.minimum_charge)?;

        if self.growth_bands.is_empty() {
            return Err(QuoteError::MissingConfigError {
                field: "growth.bands".to_string(),
            });
        }
        let mut previous: Option<u8> = None;
        for band in &self.growth_bands {
            validate_non_negative_amount(&format!("growth.bands.{}", band.label), band.percent)?;
            if let Some(prev) = previous {
                if band.upto <= prev {
                    return Err(QuoteError::ConfigValidationError {
                        field: "growth.bands".to_string(),
                        message: format!(
                            "band '{}' ends at {} which is not above {}",
                            band.label, band.upto, prev
                        ),
                    });
                }
            }
            previous = Some(band.upto);
        }
        if previous != Some(100) {
            return Err(QuoteError::ConfigValidationError {
                field: "growth.bands".to_string(),
                message: "the last band must end at 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Paint condition implied by how long ago the bottom was painted.
pub fn paint_condition_from_age(age: PaintAge) -> PaintCondition {
    match age {
        PaintAge::UpToSixMonths => PaintCondition::Excellent,
        PaintAge::SevenToTwelveMonths => PaintCondition::Good,
        PaintAge::ThirteenToTwentyOneMonths => PaintCondition::Fair,
        PaintAge::TwentyTwoToTwentyFourMonths
        | PaintAge::OverTwentyFourMonths
        | PaintAge::Unsure => PaintCondition::Poor,
    }
}

fn estimated_growth_level(paint: PaintCondition, cleaned: CleanedAge) -> GrowthLevel {
    use CleanedAge::*;

    match paint {
        PaintCondition::Excellent | PaintCondition::Good => match cleaned {
            UpToTwoMonths => GrowthLevel::Minimal,
            ThreeToFourMonths => GrowthLevel::Moderate,
            FiveToSixMonths | SevenToEightMonths => GrowthLevel::Heavy,
            _ => GrowthLevel::Severe,
        },
        PaintCondition::Fair => match cleaned {
            UpToTwoMonths => GrowthLevel::Moderate,
            ThreeToFourMonths | FiveToSixMonths => GrowthLevel::Heavy,
            _ => GrowthLevel::Severe,
        },
        PaintCondition::Poor | PaintCondition::Missing => match cleaned {
            UpToTwoMonths | ThreeToFourMonths => GrowthLevel::Heavy,
            _ => GrowthLevel::Severe,
        },
    }
}

fn estimated_growth_percent(paint: PaintCondition, cleaned: CleanedAge) -> Decimal {
    use CleanedAge::*;

    match paint {
        PaintCondition::Excellent => match cleaned {
            UpToTwoMonths | ThreeToFourMonths => dec!(0),
            FiveToSixMonths => dec!(25),
            SevenToEightMonths => dec!(40),
            NineToTwelveMonths => dec!(70),
            ThirteenToTwentyFourMonths => dec!(85),
            OverTwentyFourMonths => dec!(100),
        },
        PaintCondition::Good => match cleaned {
            UpToTwoMonths | ThreeToFourMonths => dec!(0),
            FiveToSixMonths => dec!(25),
            SevenToEightMonths => dec!(40),
            NineToTwelveMonths => dec!(75),
            ThirteenToTwentyFourMonths => dec!(90),
            OverTwentyFourMonths => dec!(100),
        },
        PaintCondition::Fair => match cleaned {
            UpToTwoMonths => dec!(0),
            ThreeToFourMonths => dec!(25),
            FiveToSixMonths => dec!(40),
            SevenToEightMonths => dec!(70),
            NineToTwelveMonths => dec!(85),
            ThirteenToTwentyFourMonths => dec!(95),
            OverTwentyFourMonths => dec!(100),
        },
        PaintCondition::Poor | PaintCondition::Missing => match cleaned {
            UpToTwoMonths => dec!(30),
            ThreeToFourMonths => dec!(50),
            FiveToSixMonths => dec!(80),
            SevenToEightMonths => dec!(90),
            NineToTwelveMonths => dec!(95),
            ThirteenToTwentyFourMonths | OverTwentyFourMonths => dec!(100),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthEstimate {
    pub paint: PaintCondition,
    pub level: GrowthLevel,
    pub percent: Decimal,
}

/// Estimates growth for customers who only know when they last painted
/// and cleaned.
pub fn estimate_growth(history: CleaningHistory) -> GrowthEstimate {
    let paint = paint_condition_from_age(history.last_painted);
    GrowthEstimate {
        paint,
        level: estimated_growth_level(paint, history.last_cleaned),
        percent: estimated_growth_percent(paint, history.last_cleaned),
    }
}
