use crate::core::checkout::{sanitize, NOTES_TEXT_LIMIT};
use crate::domain::model::{ChargeReceipt, ChargeRequest, Quote};
use crate::domain::ports::PaymentFunctions;
use crate::utils::error::{QuoteError, Result};
use crate::utils::money::{format_usd, RoundingPolicy};
use crate::utils::validation::{validate_non_empty_string, validate_positive_amount};
use rust_decimal::Decimal;

/// Where the charged amount comes from.
#[derive(Debug, Clone)]
pub enum ChargeAmount {
    /// Entered by staff after the job.
    Explicit(Decimal),
    /// Recomputed from a quote, rounded by the admin policy.
    FromQuote(Quote),
}

impl ChargeAmount {
    pub fn resolve(&self, rounding: RoundingPolicy) -> Decimal {
        match self {
            ChargeAmount::Explicit(amount) => *amount,
            ChargeAmount::FromQuote(quote) => rounding.apply(quote.total),
        }
    }
}

/// Builds the `charge-for-service` request without sending it.
pub fn prepare_charge(
    order_id: &str,
    amount: &ChargeAmount,
    notes: &str,
    rounding: RoundingPolicy,
) -> Result<ChargeRequest> {
    validate_non_empty_string("orderId", order_id)?;
    let final_amount = amount.resolve(rounding);
    validate_positive_amount("finalAmount", final_amount)?;

    Ok(ChargeRequest {
        order_id: order_id.trim().to_string(),
        final_amount,
        notes: sanitize(notes, NOTES_TEXT_LIMIT),
    })
}

/// Charges a customer's saved card for a completed job.
pub struct ChargeService<P: PaymentFunctions> {
    payments: P,
    rounding: RoundingPolicy,
}

impl<P: PaymentFunctions> ChargeService<P> {
    pub fn new(payments: P, rounding: RoundingPolicy) -> Self {
        Self { payments, rounding }
    }

    pub async fn charge(
        &self,
        order_id: &str,
        amount: &ChargeAmount,
        notes: &str,
        access_token: &str,
    ) -> Result<ChargeReceipt> {
        if access_token.trim().is_empty() {
            return Err(QuoteError::MissingConfigError {
                field: "access_token".to_string(),
            });
        }
        let request = prepare_charge(order_id, amount, notes, self.rounding)?;

        tracing::info!(
            order_id = %request.order_id,
            amount = %format_usd(request.final_amount),
            "Charging for service"
        );
        let receipt = self
            .payments
            .charge_for_service(&request, access_token)
            .await?;

        if !receipt.success {
            return Err(QuoteError::RemoteError {
                service: "charge-for-service".to_string(),
                status: 200,
                message: "charge was not confirmed".to_string(),
            });
        }
        tracing::info!(
            payment_intent = %receipt.payment_intent_id,
            charged = %format_usd(receipt.amount_charged),
            "Charge confirmed"
        );
        Ok(receipt)
    }
}
