use crate::utils::error::QuoteError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKey {
    RecurringCleaning,
    OnetimeCleaning,
    UnderwaterInspection,
    ItemRecovery,
    PropellerService,
    AnodesOnly,
}

impl ServiceKey {
    pub const ALL: [ServiceKey; 6] = [
        ServiceKey::RecurringCleaning,
        ServiceKey::OnetimeCleaning,
        ServiceKey::AnodesOnly,
        ServiceKey::UnderwaterInspection,
        ServiceKey::ItemRecovery,
        ServiceKey::PropellerService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKey::RecurringCleaning => "recurring_cleaning",
            ServiceKey::OnetimeCleaning => "onetime_cleaning",
            ServiceKey::UnderwaterInspection => "underwater_inspection",
            ServiceKey::ItemRecovery => "item_recovery",
            ServiceKey::PropellerService => "propeller_service",
            ServiceKey::AnodesOnly => "anodes_only",
        }
    }

    /// Growth surcharges only apply to hull cleanings.
    pub fn is_cleaning(&self) -> bool {
        matches!(
            self,
            ServiceKey::RecurringCleaning | ServiceKey::OnetimeCleaning
        )
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ServiceKey {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| QuoteError::UnknownService { key: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    PerFoot,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullType {
    #[default]
    Monohull,
    Catamaran,
    Trimaran,
}

impl HullType {
    /// Staff enter hulls as a count of extra hulls beyond the first.
    pub fn from_additional_hulls(additional: u8) -> Self {
        match additional {
            0 => HullType::Monohull,
            1 => HullType::Catamaran,
            _ => HullType::Trimaran,
        }
    }
}

impl FromStr for HullType {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monohull" => Ok(HullType::Monohull),
            "catamaran" => Ok(HullType::Catamaran),
            "trimaran" => Ok(HullType::Trimaran),
            other => Err(QuoteError::validation(
                "hull_type",
                format!("'{}' is not monohull, catamaran or trimaran", other),
            )),
        }
    }
}

/// Recorded for the service log; never priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Missing,
}

impl fmt::Display for PaintCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaintCondition::Excellent => "Excellent",
            PaintCondition::Good => "Good",
            PaintCondition::Fair => "Fair",
            PaintCondition::Poor => "Poor",
            PaintCondition::Missing => "Missing",
        };
        f.write_str(label)
    }
}

impl FromStr for PaintCondition {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(PaintCondition::Excellent),
            "good" => Ok(PaintCondition::Good),
            "fair" => Ok(PaintCondition::Fair),
            "poor" => Ok(PaintCondition::Poor),
            "missing" => Ok(PaintCondition::Missing),
            other => Err(QuoteError::validation(
                "paint_condition",
                format!("'{}' is not a known paint condition", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthLevel {
    #[default]
    Minimal,
    Moderate,
    Heavy,
    Severe,
}

impl fmt::Display for GrowthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GrowthLevel::Minimal => "Minimal",
            GrowthLevel::Moderate => "Moderate",
            GrowthLevel::Heavy => "Heavy",
            GrowthLevel::Severe => "Severe",
        };
        f.write_str(label)
    }
}

impl FromStr for GrowthLevel {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(GrowthLevel::Minimal),
            "moderate" => Ok(GrowthLevel::Moderate),
            "heavy" => Ok(GrowthLevel::Heavy),
            "severe" => Ok(GrowthLevel::Severe),
            other => Err(QuoteError::validation(
                "growth_level",
                format!("'{}' is not a known growth level", other),
            )),
        }
    }
}

/// Time since the bottom was last painted, as offered by the customer wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintAge {
    #[serde(rename = "0-6_months")]
    UpToSixMonths,
    #[serde(rename = "7-12_months")]
    SevenToTwelveMonths,
    #[serde(rename = "13-21_months")]
    ThirteenToTwentyOneMonths,
    #[serde(rename = "22-24_months")]
    TwentyTwoToTwentyFourMonths,
    #[serde(rename = "over_24_months")]
    OverTwentyFourMonths,
    #[serde(rename = "unsure_paint")]
    Unsure,
}

/// Time since the hull was last cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanedAge {
    #[serde(rename = "0-2_months")]
    UpToTwoMonths,
    #[serde(rename = "3-4_months")]
    ThreeToFourMonths,
    #[serde(rename = "5-6_months")]
    FiveToSixMonths,
    #[serde(rename = "7-8_months")]
    SevenToEightMonths,
    #[serde(rename = "9-12_months")]
    NineToTwelveMonths,
    #[serde(rename = "13-24_months")]
    ThirteenToTwentyFourMonths,
    #[serde(rename = "over_24_months_unsure")]
    OverTwentyFourMonths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningHistory {
    pub last_painted: PaintAge,
    pub last_cleaned: CleanedAge,
}

/// How the growth on the hull was described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum GrowthInput {
    /// Diver's slider position, 0 to 100.
    Slider(u8),
    Level(GrowthLevel),
    Estimated(CleaningHistory),
}

impl Default for GrowthInput {
    fn default() -> Self {
        GrowthInput::Level(GrowthLevel::Minimal)
    }
}

/// `service` has no default; every other field may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub service: ServiceKey,
    #[serde(default)]
    pub boat_length_ft: Option<Decimal>,
    #[serde(default)]
    pub hull_type: HullType,
    #[serde(default)]
    pub is_powerboat: bool,
    #[serde(default)]
    pub has_twin_engines: bool,
    #[serde(default)]
    pub paint_condition: PaintCondition,
    #[serde(default)]
    pub growth: GrowthInput,
    #[serde(default)]
    pub anode_selections: BTreeMap<String, u32>,
    /// Flat-rate multiplier, e.g. propellers serviced.
    #[serde(default = "default_units")]
    pub units: u32,
}

fn default_units() -> u32 {
    1
}

impl QuoteInput {
    pub fn new(service: ServiceKey) -> Self {
        Self {
            service,
            boat_length_ft: None,
            hull_type: HullType::Monohull,
            is_powerboat: false,
            has_twin_engines: false,
            paint_condition: PaintCondition::Good,
            growth: GrowthInput::default(),
            anode_selections: BTreeMap::new(),
            units: 1,
        }
    }

    pub fn with_length(mut self, feet: Decimal) -> Self {
        self.boat_length_ft = Some(feet);
        self
    }

    pub fn with_hull(mut self, hull: HullType) -> Self {
        self.hull_type = hull;
        self
    }

    pub fn with_powerboat(mut self, is_powerboat: bool) -> Self {
        self.is_powerboat = is_powerboat;
        self
    }

    pub fn with_twin_engines(mut self, twin: bool) -> Self {
        self.has_twin_engines = twin;
        self
    }

    pub fn with_paint(mut self, paint: PaintCondition) -> Self {
        self.paint_condition = paint;
        self
    }

    pub fn with_growth(mut self, growth: GrowthInput) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }

    pub fn with_anode(mut self, id: impl Into<String>, quantity: u32) -> Self {
        *self.anode_selections.entry(id.into()).or_insert(0) += quantity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeKind {
    Hull,
    Powerboat,
    TwinEngines,
    Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurchargeLine {
    pub kind: SurchargeKind,
    pub label: String,
    /// Whole percent, e.g. `25` for +25%.
    pub percent: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnodeLine {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub amount: Decimal,
}

/// Itemized price for one `QuoteInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub service: ServiceKey,
    pub service_name: String,
    pub service_kind: ServiceKind,
    pub rate: Decimal,
    pub boat_length_ft: Option<Decimal>,
    pub base_price: Decimal,
    pub surcharges: Vec<SurchargeLine>,
    pub service_total: Decimal,
    pub anode_lines: Vec<AnodeLine>,
    pub anode_subtotal: Decimal,
    pub labor_cost: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub minimum_applied: bool,
    pub paint_condition: PaintCondition,
    pub growth_label: Option<String>,
}

impl Quote {
    pub fn surcharge_percent(&self) -> Decimal {
        self.surcharges.iter().map(|s| s.percent).sum()
    }

    pub fn anode_count(&self) -> u32 {
        self.anode_lines.iter().map(|l| l.quantity).sum()
    }
}

/// One part from the anode catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anode {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub list_price: Decimal,
    pub category: String,
    pub material: Option<String>,
    pub description: Option<String>,
}

/// Customer checkout submission, shaped like the `formData` the
/// `create-payment-intent` function expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_birthday: Option<String>,
    pub customer_notes: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_zip: String,
    pub boat_name: String,
    pub boat_make: String,
    pub boat_model: String,
    pub boat_length: String,
    pub marina_name: String,
    pub dock: Option<String>,
    pub slip_number: Option<String>,
    /// Display name of the service, e.g. "One-time Cleaning & Anodes".
    pub service: String,
    /// `one-time`, or the months between visits: `1`, `2`, `3`, `6`.
    pub service_interval: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimate: Decimal,
    pub recovery_location: Option<String>,
    pub item_description: Option<String>,
    pub drop_date: Option<String>,
    pub service_details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Payment,
    Setup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub client_secret: String,
    pub intent_type: IntentType,
    pub order_id: String,
    pub order_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_amount: Decimal,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub success: bool,
    pub payment_intent_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_charged: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stripe_customer_id: Option<String>,
}

/// Row in the `quotes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_number: String,
    pub quote_date: chrono::NaiveDate,
    pub expiry_date: chrono::NaiveDate,
    pub valid_days: u32,

    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub boat_name: Option<String>,
    pub boat_make: Option<String>,
    pub marina: Option<String>,
    pub slip: Option<String>,

    pub service_type: ServiceKey,
    pub service_name: String,
    pub boat_length: Option<Decimal>,
    pub paint_condition: PaintCondition,
    pub growth_level: Option<String>,
    pub has_twin_engines: bool,
    pub additional_hulls: u8,

    pub base_price: Decimal,
    pub rate_per_foot: Option<Decimal>,
    pub anode_cost: Decimal,
    pub anode_labor_cost: Decimal,
    pub total_cost: Decimal,
    pub currency: String,

    pub anodes: Vec<AnodeLine>,
    pub status: QuoteStatus,
    pub created_by: String,

    /// Set by the database on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a saved quote. New quotes go out as `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    #[default]
    Sent,
    Viewed,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 6] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Viewed,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
        QuoteStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Viewed => "viewed",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        QuoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                QuoteError::validation("status", format!("'{}' is not a quote status", s.trim()))
            })
    }
}

/// PATCH body for a status change. Accepting or rejecting also stamps
/// the matching timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteStatusChange {
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
}

impl QuoteStatusChange {
    pub fn new(status: QuoteStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            accepted_at: (status == QuoteStatus::Accepted).then_some(now),
            rejected_at: (status == QuoteStatus::Rejected).then_some(now),
        }
    }
}

/// Filters for listing quotes, newest first. Both dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFilter {
    pub customer_email: Option<String>,
    pub status: Option<QuoteStatus>,
    pub from_date: Option<chrono::NaiveDate>,
    pub to_date: Option<chrono::NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_service_key_round_trips_through_str() {
        for key in ServiceKey::ALL {
            assert_eq!(key.as_str().parse::<ServiceKey>().unwrap(), key);
        }
        assert!(matches!(
            "hull_polish".parse::<ServiceKey>(),
            Err(QuoteError::UnknownService { .. })
        ));
    }

    #[test]
    fn test_hull_from_additional_hulls() {
        assert_eq!(HullType::from_additional_hulls(0), HullType::Monohull);
        assert_eq!(HullType::from_additional_hulls(1), HullType::Catamaran);
        assert_eq!(HullType::from_additional_hulls(2), HullType::Trimaran);
    }

    #[test]
    fn test_quote_input_from_json_uses_defaults() {
        let input: QuoteInput = serde_json::from_str(
            r#"{
                "service": "onetime_cleaning",
                "boat_length_ft": 35,
                "growth": {"mode": "slider", "value": 65},
                "anode_selections": {"CMX-2": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(input.service, ServiceKey::OnetimeCleaning);
        assert_eq!(input.boat_length_ft, Some(dec!(35)));
        assert_eq!(input.hull_type, HullType::Monohull);
        assert_eq!(input.growth, GrowthInput::Slider(65));
        assert_eq!(input.units, 1);
        assert_eq!(input.anode_selections.get("CMX-2"), Some(&2));
    }

    #[test]
    fn test_quote_input_without_service_is_rejected() {
        let result = serde_json::from_str::<QuoteInput>(r#"{"boat_length_ft": 35}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("missing field `service`"));

        assert!(serde_json::from_str::<QuoteInput>(r#"{"service": "teak_polish"}"#).is_err());
    }

    #[test]
    fn test_quote_status_parses_case_insensitively() {
        assert_eq!("Accepted".parse::<QuoteStatus>().unwrap(), QuoteStatus::Accepted);
        assert_eq!(" sent ".parse::<QuoteStatus>().unwrap(), QuoteStatus::Sent);
        assert!("paid".parse::<QuoteStatus>().is_err());
    }

    #[test]
    fn test_status_change_stamps_accept_and_reject() {
        let now = "2026-05-02T09:30:00Z".parse::<DateTime<Utc>>().unwrap();

        let accepted = QuoteStatusChange::new(QuoteStatus::Accepted, now);
        assert_eq!(
            serde_json::to_value(&accepted).unwrap(),
            serde_json::json!({"status": "accepted", "accepted_at": "2026-05-02T09:30:00Z"})
        );

        let rejected = QuoteStatusChange::new(QuoteStatus::Rejected, now);
        assert_eq!(rejected.rejected_at, Some(now));
        assert!(rejected.accepted_at.is_none());

        let expired = QuoteStatusChange::new(QuoteStatus::Expired, now);
        assert_eq!(
            serde_json::to_value(&expired).unwrap(),
            serde_json::json!({"status": "expired"})
        );
    }

    #[test]
    fn test_cleaning_history_uses_wizard_values() {
        let growth: GrowthInput = serde_json::from_str(
            r#"{"mode": "estimated", "value": {"last_painted": "7-12_months", "last_cleaned": "over_24_months_unsure"}}"#,
        )
        .unwrap();
        assert_eq!(
            growth,
            GrowthInput::Estimated(CleaningHistory {
                last_painted: PaintAge::SevenToTwelveMonths,
                last_cleaned: CleanedAge::OverTwentyFourMonths,
            })
        );
    }

    #[test]
    fn test_checkout_form_serializes_camel_case() {
        let form = CheckoutForm {
            customer_email: "skipper@example.com".to_string(),
            service_interval: "one-time".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["customerEmail"], "skipper@example.com");
        assert_eq!(value["serviceInterval"], "one-time");
    }
}
