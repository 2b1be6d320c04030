use dive_quote::domain::model::{HullType, QuoteInput, ServiceKey};
use dive_quote::utils::money::RoundingPolicy;
use dive_quote::{
    AnodeCatalog, ChargeAmount, ChargeService, PricingEngine, QuoteError, SupabaseClient,
};
use httpmock::prelude::*;
use rust_decimal_macros::dec;

fn catamaran_quote_amount() -> ChargeAmount {
    let input = QuoteInput::new(ServiceKey::OnetimeCleaning)
        .with_length(dec!(55))
        .with_hull(HullType::Catamaran)
        .with_twin_engines(true);
    let quote = PricingEngine::default()
        .calculate(&input, &AnodeCatalog::default())
        .unwrap();
    ChargeAmount::FromQuote(quote)
}

#[tokio::test]
async fn test_charge_rounds_quote_and_uses_staff_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/functions/v1/charge-for-service")
            .header("authorization", "Bearer staff-session-token")
            .header("apikey", "anon-key")
            .json_body(serde_json::json!({
                "orderId": "ord_1",
                "finalAmount": 450.0,
                "notes": "Replaced shaft anode"
            }));
        then.status(200).json_body(serde_json::json!({
            "success": true,
            "paymentIntentId": "pi_789",
            "amountCharged": 450.0
        }));
    });

    let service = ChargeService::new(
        SupabaseClient::new(server.base_url(), "anon-key"),
        RoundingPolicy::NearestTen,
    );
    let receipt = service
        .charge(
            "ord_1",
            &catamaran_quote_amount(),
            "  Replaced <shaft> anode ",
            "staff-session-token",
        )
        .await
        .unwrap();

    mock.assert();
    assert_eq!(receipt.payment_intent_id, "pi_789");
    assert_eq!(receipt.amount_charged, dec!(450));
}

#[tokio::test]
async fn test_forbidden_charge_suggests_sign_in() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/functions/v1/charge-for-service");
        then.status(403)
            .json_body(serde_json::json!({"error": "Admin access required"}));
    });

    let service = ChargeService::new(
        SupabaseClient::new(server.base_url(), "anon-key"),
        RoundingPolicy::NearestTen,
    );
    let err = service
        .charge("ord_1", &ChargeAmount::Explicit(dec!(120)), "", "customer-token")
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteError::RemoteError { status: 403, .. }));
    assert!(err.recovery_suggestion().contains("admin access"));
}

#[tokio::test]
async fn test_unconfirmed_charge_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/functions/v1/charge-for-service");
        then.status(200).json_body(serde_json::json!({
            "success": false,
            "paymentIntentId": "pi_000",
            "amountCharged": 0.0
        }));
    });

    let service = ChargeService::new(
        SupabaseClient::new(server.base_url(), "anon-key"),
        RoundingPolicy::None,
    );
    let result = service
        .charge("ord_1", &ChargeAmount::Explicit(dec!(99)), "", "staff-session-token")
        .await;
    assert!(matches!(result, Err(QuoteError::RemoteError { .. })));
}

#[test]
fn test_missing_token_fails_before_any_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/functions/v1/charge-for-service");
        then.status(200);
    });
    let service = ChargeService::new(
        SupabaseClient::new(server.base_url(), "anon-key"),
        RoundingPolicy::NearestTen,
    );

    let result = tokio_test::block_on(service.charge(
        "ord_1",
        &ChargeAmount::Explicit(dec!(120)),
        "",
        "   ",
    ));

    assert!(matches!(result, Err(QuoteError::MissingConfigError { .. })));
    mock.assert_hits(0);
}
