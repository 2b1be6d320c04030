use dive_quote::core::rates::RateCard;
use dive_quote::domain::model::{GrowthInput, GrowthLevel, HullType, QuoteInput, ServiceKey};
use dive_quote::utils::money::{format_usd, RoundingPolicy};
use dive_quote::{AnodeCatalog, PricingEngine, QuoteError, TomlConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn catalog() -> AnodeCatalog {
    AnodeCatalog::from_json(
        br#"{"anodes": [
            {"boatzincs_id": "CMX-2", "sku": "CMX-2", "name": "Camp X-2 Shaft Anode 1\" Zinc", "list_price": "$18.00", "category": "shaft_anodes", "material": "zinc"},
            {"boatzincs_id": "MT-50", "sku": "MT-50", "name": "Martyr Prop Nut Anode", "list_price": 9.5, "category": "propeller", "material": "aluminum"}
        ]}"#,
    )
    .unwrap()
}

/// 35 ft monohull one-time cleaning with minimal growth.
#[test]
fn test_basic_one_time_cleaning() {
    let input = QuoteInput::new(ServiceKey::OnetimeCleaning).with_length(dec!(35));
    let quote = PricingEngine::default().calculate(&input, &catalog()).unwrap();

    assert_eq!(quote.total, dec!(210));
    assert_eq!(format_usd(quote.total), "$210.00");
}

/// Admin rounds the catamaran with twin engines up to the nearest ten.
#[test]
fn test_catamaran_twin_engines_admin_rounding() {
    let input = QuoteInput::new(ServiceKey::OnetimeCleaning)
        .with_length(dec!(55))
        .with_hull(HullType::Catamaran)
        .with_twin_engines(true);
    let quote = PricingEngine::default().calculate(&input, &catalog()).unwrap();

    assert_eq!(quote.total, dec!(445.50));
    assert_eq!(RoundingPolicy::NearestTen.apply(quote.total), dec!(450));
    assert_eq!(RoundingPolicy::None.apply(quote.total), dec!(445.50));
}

#[test]
fn test_growth_slider_scenarios() {
    let engine = PricingEngine::default();
    let base = dec!(4.50) * dec!(40);
    let expected = [
        (10, 0),
        (55, 0),
        (60, 35),
        (65, 75),
        (75, 100),
        (85, 150),
        (95, 200),
        (100, 200),
    ];
    for (slider, percent) in expected {
        let input = QuoteInput::new(ServiceKey::RecurringCleaning)
            .with_length(dec!(40))
            .with_growth(GrowthInput::Slider(slider));
        let quote = engine.calculate(&input, &catalog()).unwrap();
        let expected = base * (Decimal::ONE + Decimal::from(percent) / Decimal::ONE_HUNDRED);
        assert_eq!(quote.total, expected, "slider {}", slider);
    }

    let out_of_range = QuoteInput::new(ServiceKey::RecurringCleaning)
        .with_length(dec!(40))
        .with_growth(GrowthInput::Slider(101));
    assert!(matches!(
        engine.calculate(&out_of_range, &catalog()),
        Err(QuoteError::ValidationError { .. })
    ));
}

#[test]
fn test_pricing_is_pure_and_total_never_below_base() {
    let engine = PricingEngine::default();
    let catalog = catalog();
    let input = QuoteInput::new(ServiceKey::RecurringCleaning)
        .with_length(dec!(48))
        .with_hull(HullType::Trimaran)
        .with_powerboat(true)
        .with_growth(GrowthInput::Level(GrowthLevel::Severe))
        .with_anode("CMX-2", 2)
        .with_anode("MT-50", 1);

    let first = engine.calculate(&input, &catalog).unwrap();
    let second = engine.calculate(&input, &catalog).unwrap();
    assert_eq!(first, second);
    assert!(first.total >= first.base_price);

    // 48 × 4.50 = 216, +275% = 810, parts 45.50, labor 3 × 15.
    assert_eq!(first.service_total, dec!(810));
    assert_eq!(first.anode_subtotal, dec!(45.50));
    assert_eq!(first.labor_cost, dec!(45));
    assert_eq!(first.total, dec!(900.50));
}

#[test]
fn test_anodes_only_visit() {
    let input = QuoteInput::new(ServiceKey::AnodesOnly).with_anode("MT-50", 4);
    let quote = PricingEngine::default().calculate(&input, &catalog()).unwrap();

    assert_eq!(quote.base_price, dec!(150));
    assert_eq!(quote.anode_subtotal, dec!(38));
    assert_eq!(quote.labor_cost, dec!(60));
    assert_eq!(quote.total, dec!(248));
}

#[test]
fn test_rates_from_config_flow_into_quotes() {
    let config = TomlConfig::from_toml_str(
        r#"
[rates.services.onetime_cleaning]
rate = 7

[surcharges]
twin_engines = 20
"#,
    )
    .unwrap();
    let rates: RateCard = config.rate_card().unwrap();
    let input = QuoteInput::new(ServiceKey::OnetimeCleaning)
        .with_length(dec!(30))
        .with_twin_engines(true);

    let quote = PricingEngine::new(rates).calculate(&input, &catalog()).unwrap();
    assert_eq!(quote.base_price, dec!(210));
    assert_eq!(quote.total, dec!(252));
}

/// Quote input files must name the service; nothing is priced otherwise.
#[test]
fn test_input_file_without_service_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("quote.json");
    std::fs::write(&path, r#"{"boat_length_ft": 35, "hull_type": "catamaran"}"#).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let parsed = serde_json::from_slice::<QuoteInput>(&bytes).map_err(QuoteError::from);
    assert!(matches!(parsed, Err(QuoteError::SerializationError(_))));

    std::fs::write(&path, r#"{"service": "onetime_cleaning", "boat_length_ft": 35}"#).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let input: QuoteInput = serde_json::from_slice(&bytes).unwrap();
    let quote = PricingEngine::default().calculate(&input, &catalog()).unwrap();
    assert_eq!(quote.total, dec!(210));
}

/// Lengths too large to price come back as a validation error.
#[test]
fn test_extreme_lengths_never_panic() {
    let engine = PricingEngine::default();
    let huge_but_priceable = Decimal::from_i128_with_scale(10i128.pow(20), 0);
    let cases = [
        (Decimal::MAX, false),
        (Decimal::MAX / dec!(2), false),
        (huge_but_priceable, true),
    ];
    for (length, priceable) in cases {
        let input = QuoteInput::new(ServiceKey::RecurringCleaning)
            .with_length(length)
            .with_hull(HullType::Trimaran)
            .with_growth(GrowthInput::Level(GrowthLevel::Severe));
        let result = std::panic::catch_unwind(|| engine.calculate(&input, &catalog()));
        let outcome = result.expect("calculate must not panic");
        if priceable {
            assert!(outcome.is_ok());
        } else {
            assert!(matches!(outcome, Err(QuoteError::ValidationError { .. })));
        }
    }
}
