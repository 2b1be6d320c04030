use crate::domain::model::{
    HullType, Quote, QuoteInput, QuoteRecord, QuoteStatus, ServiceKind,
};
use crate::domain::ports::QuoteRepository;
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;
use chrono::{DateTime, Days, NaiveDate, Utc};

pub const DEFAULT_VALID_DAYS: u32 = 30;

/// `QT-YYYYMMDD-NNNN`.
pub fn generate_quote_number(date: NaiveDate) -> String {
    let suffix = uuid::Uuid::new_v4().as_u128() % 10_000;
    format!("QT-{}-{:04}", date.format("%Y%m%d"), suffix)
}

#[derive(Debug, Clone, Default)]
pub struct QuoteContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub boat_name: Option<String>,
    pub boat_make: Option<String>,
    pub marina: Option<String>,
    pub slip: Option<String>,
}

fn additional_hulls(hull: HullType) -> u8 {
    match hull {
        HullType::Monohull => 0,
        HullType::Catamaran => 1,
        HullType::Trimaran => 2,
    }
}

/// Builds the row saved to the `quotes` table.
pub fn build_record(
    contact: QuoteContact,
    input: &QuoteInput,
    quote: &Quote,
    quote_date: NaiveDate,
    valid_days: u32,
) -> Result<QuoteRecord> {
    validate_non_empty_string("customer_name", &contact.name)?;
    let expiry_date = quote_date
        .checked_add_days(Days::new(u64::from(valid_days)))
        .unwrap_or(NaiveDate::MAX);

    Ok(QuoteRecord {
        quote_number: generate_quote_number(quote_date),
        quote_date,
        expiry_date,
        valid_days,
        customer_name: contact.name,
        customer_email: contact.email,
        customer_phone: contact.phone,
        boat_name: contact.boat_name,
        boat_make: contact.boat_make,
        marina: contact.marina,
        slip: contact.slip,
        service_type: quote.service,
        service_name: quote.service_name.clone(),
        boat_length: quote.boat_length_ft,
        paint_condition: quote.paint_condition,
        growth_level: quote.growth_label.clone(),
        has_twin_engines: input.has_twin_engines,
        additional_hulls: additional_hulls(input.hull_type),
        base_price: quote.base_price,
        rate_per_foot: (quote.service_kind == ServiceKind::PerFoot).then_some(quote.rate),
        anode_cost: quote.anode_subtotal,
        anode_labor_cost: quote.labor_cost,
        total_cost: quote.total,
        currency: "USD".to_string(),
        anodes: quote.anode_lines.clone(),
        status: QuoteStatus::Sent,
        created_by: "admin".to_string(),
        created_at: None,
        viewed_at: None,
        accepted_at: None,
        rejected_at: None,
    })
}

/// Fetches a quote for the customer and stamps `viewed_at` the first time.
/// A failed stamp is logged and the quote is still returned.
pub async fn open_quote<R: QuoteRepository + ?Sized>(
    repo: &R,
    quote_number: &str,
    now: DateTime<Utc>,
) -> Result<Option<QuoteRecord>> {
    let Some(mut record) = repo.find_quote(quote_number).await? else {
        return Ok(None);
    };
    if record.viewed_at.is_none() {
        match repo.mark_quote_viewed(&record.quote_number, now).await {
            Ok(()) => record.viewed_at = Some(now),
            Err(e) => tracing::warn!(
                quote_number = %record.quote_number,
                "Could not mark quote as viewed: {}",
                e
            ),
        }
    }
    Ok(Some(record))
}

impl QuoteRecord {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.expiry_date
    }

    /// Status to show: an open quote past its expiry date reads as expired.
    pub fn effective_status(&self, today: NaiveDate) -> QuoteStatus {
        match self.status {
            QuoteStatus::Draft | QuoteStatus::Sent | QuoteStatus::Viewed
                if self.is_expired(today) =>
            {
                QuoteStatus::Expired
            }
            status => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::AnodeCatalog;
    use crate::core::pricing::PricingEngine;
    use crate::domain::model::ServiceKey;
    use regex::Regex;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let number = generate_quote_number(date);
        assert!(Regex::new(r"^QT-20260307-\d{4}$").unwrap().is_match(&number), "{}", number);
    }

    #[test]
    fn test_build_record_sets_expiry_and_pricing() {
        let input = QuoteInput::new(ServiceKey::OnetimeCleaning)
            .with_length(dec!(55))
            .with_hull(HullType::Catamaran)
            .with_twin_engines(true);
        let quote = PricingEngine::default()
            .calculate(&input, &AnodeCatalog::default())
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let contact = QuoteContact {
            name: "Pat Mariner".to_string(),
            boat_name: Some("Second Wind".to_string()),
            ..Default::default()
        };

        let record = build_record(contact, &input, &quote, date, DEFAULT_VALID_DAYS).unwrap();

        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
        assert_eq!(record.additional_hulls, 1);
        assert_eq!(record.rate_per_foot, Some(dec!(6.00)));
        assert_eq!(record.total_cost, dec!(445.50));
        assert!(!record.is_expired(date));
        assert!(record.is_expired(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()));
        assert_eq!(record.status, QuoteStatus::Sent);
    }

    #[test]
    fn test_effective_status_keeps_decided_quotes() {
        let input = QuoteInput::new(ServiceKey::ItemRecovery);
        let quote = PricingEngine::default()
            .calculate(&input, &AnodeCatalog::default())
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let contact = QuoteContact {
            name: "Pat Mariner".to_string(),
            ..Default::default()
        };
        let mut record = build_record(contact, &input, &quote, date, 10).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert_eq!(record.effective_status(date), QuoteStatus::Sent);
        assert_eq!(record.effective_status(later), QuoteStatus::Expired);

        record.status = QuoteStatus::Accepted;
        assert_eq!(record.effective_status(later), QuoteStatus::Accepted);
    }

    #[test]
    fn test_build_record_requires_name() {
        let input = QuoteInput::new(ServiceKey::ItemRecovery);
        let quote = PricingEngine::default()
            .calculate(&input, &AnodeCatalog::default())
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert!(build_record(QuoteContact::default(), &input, &quote, date, 30).is_err());
    }
}
