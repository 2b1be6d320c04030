use crate::core::rates::RateCard;
use crate::domain::model::{CheckoutForm, CheckoutSession, Quote, ServiceKind};
use crate::domain::ports::PaymentFunctions;
use crate::utils::error::{QuoteError, Result};
use crate::utils::money::RoundingPolicy;
use crate::utils::validation::{validate_email, validate_non_empty_string};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const FORM_TEXT_LIMIT: usize = 1000;
pub const NOTES_TEXT_LIMIT: usize = 2000;

const SERVICE_INTERVALS: [&str; 5] = ["one-time", "1", "2", "3", "6"];

/// Strips angle brackets, trims, and caps the length in characters.
pub fn sanitize(text: &str, limit: usize) -> String {
    text.chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect::<String>()
        .trim()
        .chars()
        .take(limit)
        .collect()
}

fn sanitize_opt(text: &mut Option<String>) {
    if let Some(value) = text.as_mut() {
        *value = sanitize(value, FORM_TEXT_LIMIT);
    }
}

pub fn sanitize_form(form: &mut CheckoutForm) {
    form.customer_name = sanitize(&form.customer_name, FORM_TEXT_LIMIT);
    form.customer_notes = sanitize(&form.customer_notes, FORM_TEXT_LIMIT);
    form.boat_name = sanitize(&form.boat_name, FORM_TEXT_LIMIT);
    form.boat_make = sanitize(&form.boat_make, FORM_TEXT_LIMIT);
    form.boat_model = sanitize(&form.boat_model, FORM_TEXT_LIMIT);
    sanitize_opt(&mut form.recovery_location);
    sanitize_opt(&mut form.item_description);
}

/// Fixed-window limiter keyed by customer email.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, (u32, Instant)>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let key = key.trim().to_lowercase();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.get_mut(&key) {
            Some((count, reset_at)) if now <= *reset_at => {
                if *count >= self.max_requests {
                    return Err(QuoteError::RateLimited { key });
                }
                *count += 1;
            }
            _ => {
                entries.insert(key, (1, now + self.window));
            }
        }
        Ok(())
    }
}

/// `serviceDetails.boatLength` when it is filled in, else the form field.
fn submitted_length(form: &CheckoutForm) -> String {
    let detail = form
        .service_details
        .as_ref()
        .and_then(|details| details.get("boatLength"));
    match detail {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => form.boat_length.clone(),
    }
}

/// Whole feet from the leading digits, so `"35.5"` reads as 35.
fn whole_feet(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Mirrors the sanity check the payment function runs on estimates.
pub fn validate_estimate(rates: &RateCard, form: &CheckoutForm) -> Result<()> {
    let (_, service) = rates.service_by_name(&form.service).ok_or_else(|| {
        QuoteError::UnknownService {
            key: form.service.clone(),
        }
    })?;
    let estimate = form.estimate;

    match service.kind {
        ServiceKind::Flat => {
            let max = service.rate * dec!(5);
            if estimate < service.rate || estimate > max {
                return Err(QuoteError::validation(
                    "estimate",
                    format!(
                        "{} must be between {} and {} for {}",
                        estimate, service.rate, max, service.name
                    ),
                ));
            }
        }
        ServiceKind::PerFoot => {
            let raw_length = submitted_length(form);
            let length = whole_feet(&raw_length).ok_or_else(|| {
                QuoteError::validation(
                    "boatLength",
                    format!("'{}' is not a number of feet", raw_length),
                )
            })?;
            if !(10..=300).contains(&length) {
                return Err(QuoteError::validation(
                    "boatLength",
                    format!("{} ft is outside 10-300 ft", length),
                ));
            }
            let minimum = rates.minimum_charge;
            let base = (Decimal::from(length) * service.rate).max(minimum);
            let max = base * dec!(4);
            if estimate < minimum || estimate > max {
                return Err(QuoteError::validation(
                    "estimate",
                    format!(
                        "{} must be between {} and {} for a {} ft boat",
                        estimate, minimum, max, length
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Copies service, boat length and the rounded estimate from a quote.
pub fn apply_quote(form: &mut CheckoutForm, quote: &Quote, rounding: RoundingPolicy) {
    form.service = quote.service_name.clone();
    if let Some(length) = quote.boat_length_ft {
        form.boat_length = length.trunc().to_string();
    }
    form.estimate = rounding.apply(quote.total);
}

pub struct CheckoutService<P: PaymentFunctions> {
    payments: P,
    rates: RateCard,
    limiter: RateLimiter,
}

impl<P: PaymentFunctions> CheckoutService<P> {
    pub fn new(payments: P, rates: RateCard, limiter: RateLimiter) -> Self {
        Self {
            payments,
            rates,
            limiter,
        }
    }

    /// Validates and submits the form. Returns the Stripe client secret
    /// and the new order.
    pub async fn submit(&self, mut form: CheckoutForm) -> Result<CheckoutSession> {
        sanitize_form(&mut form);
        validate_non_empty_string("customerName", &form.customer_name)?;
        validate_email("customerEmail", &form.customer_email)?;
        if !SERVICE_INTERVALS.contains(&form.service_interval.as_str()) {
            return Err(QuoteError::validation(
                "serviceInterval",
                format!(
                    "'{}' is not one of {}",
                    form.service_interval,
                    SERVICE_INTERVALS.join(", ")
                ),
            ));
        }

        self.limiter.check(&form.customer_email)?;
        validate_estimate(&self.rates, &form)?;

        tracing::info!(
            service = %form.service,
            interval = %form.service_interval,
            estimate = %form.estimate,
            "Submitting checkout"
        );
        let session = self.payments.create_payment_intent(&form).await?;
        tracing::info!(
            order_number = %session.order_number,
            intent = ?session.intent_type,
            "Checkout created"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(service: &str, length: &str, estimate: Decimal) -> CheckoutForm {
        CheckoutForm {
            customer_name: "Pat Mariner".to_string(),
            customer_email: "pat@example.com".to_string(),
            service: service.to_string(),
            service_interval: "one-time".to_string(),
            boat_length: length.to_string(),
            estimate,
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  <b>Second Wind</b> ", 1000), "bSecond Wind/b");
        assert_eq!(sanitize("abcdef", 3), "abc");
    }

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("Pat@Example.com", start).is_ok());
        assert!(limiter.check_at("pat@example.com", start).is_ok());
        assert!(matches!(
            limiter.check_at("pat@example.com", start),
            Err(QuoteError::RateLimited { .. })
        ));
        assert!(limiter.check_at("other@example.com", start).is_ok());
        assert!(limiter
            .check_at("pat@example.com", start + Duration::from_secs(61))
            .is_ok());
    }

    #[test]
    fn test_validate_per_foot_estimate() {
        let rates = RateCard::default();
        let onetime = |length: &str, estimate| {
            validate_estimate(&rates, &form("One-time Cleaning & Anodes", length, estimate))
        };
        assert!(onetime("35", dec!(210)).is_ok());
        // Four times base is the ceiling.
        assert!(onetime("35", dec!(840)).is_ok());
        assert!(onetime("35", dec!(841)).is_err());
        assert!(onetime("35", dec!(149)).is_err());
        assert!(onetime("8", dec!(150)).is_err());
        assert!(onetime("abc", dec!(150)).is_err());
    }

    #[test]
    fn test_fractional_length_truncates_to_whole_feet() {
        let rates = RateCard::default();
        let onetime = |length: &str, estimate| {
            validate_estimate(&rates, &form("One-time Cleaning & Anodes", length, estimate))
        };
        // 35.5 ft prices as 35 ft, so the ceiling is 4 × 210.
        assert!(onetime("35.5", dec!(840)).is_ok());
        assert!(onetime("35.5", dec!(841)).is_err());
        assert!(onetime(" 40ft", dec!(240)).is_ok());
        assert!(onetime("9.9", dec!(150)).is_err());
        assert!(onetime("-40", dec!(240)).is_err());
    }

    #[test]
    fn test_service_details_length_takes_precedence() {
        let rates = RateCard::default();
        let mut checkout = form("One-time Cleaning & Anodes", "8", dec!(840));
        checkout.service_details = Some(serde_json::json!({"boatLength": "35.5"}));
        assert!(validate_estimate(&rates, &checkout).is_ok());

        checkout.service_details = Some(serde_json::json!({"boatLength": 20}));
        assert!(validate_estimate(&rates, &checkout).is_err());

        // Blank details fall back to the form field.
        checkout.boat_length = "35".to_string();
        checkout.service_details = Some(serde_json::json!({"boatLength": ""}));
        assert!(validate_estimate(&rates, &checkout).is_ok());
    }

    #[test]
    fn test_validate_flat_estimate() {
        let rates = RateCard::default();
        assert!(validate_estimate(&rates, &form("Item Recovery", "", dec!(199))).is_ok());
        assert!(validate_estimate(&rates, &form("Item Recovery", "", dec!(995))).is_ok());
        assert!(validate_estimate(&rates, &form("Item Recovery", "", dec!(996))).is_err());
        assert!(matches!(
            validate_estimate(&rates, &form("Hull Polish", "", dec!(200))),
            Err(QuoteError::UnknownService { .. })
        ));
    }
}
