use crate::utils::error::{QuoteError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a flow turns an unrounded quote total into a charge amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    #[default]
    None,
    NearestTen,
}

impl RoundingPolicy {
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            RoundingPolicy::None => amount,
            RoundingPolicy::NearestTen => {
                let ten = Decimal::TEN;
                (amount / ten).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    * ten
            }
        }
    }
}

impl std::str::FromStr for RoundingPolicy {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RoundingPolicy::None),
            "nearest_ten" | "nearest-ten" | "10" => Ok(RoundingPolicy::NearestTen),
            other => Err(QuoteError::InvalidConfigValueError {
                field: "rounding".to_string(),
                value: other.to_string(),
                reason: "Expected 'none' or 'nearest_ten'".to_string(),
            }),
        }
    }
}

/// Dollars to integer cents, half away from zero.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| QuoteError::validation("amount", format!("{} cannot be charged", amount)))
}

pub fn format_usd(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${}", rounded)
}

/// Parses catalog prices such as `"$12.34"` or `"1,024.00"`.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.trim().parse::<Decimal>().ok()
}
