use crate::domain::model::{
    Anode, ChargeReceipt, ChargeRequest, CheckoutForm, CheckoutSession, CustomerSummary,
    QuoteFilter, QuoteRecord, QuoteStatus,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where the anode catalog comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_anodes(&self) -> Result<Vec<Anode>>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn save_quote(&self, record: &QuoteRecord) -> Result<QuoteRecord>;
    async fn find_quote(&self, quote_number: &str) -> Result<Option<QuoteRecord>>;
    /// Sets `viewed_at` unless it is already set.
    async fn mark_quote_viewed(&self, quote_number: &str, at: DateTime<Utc>) -> Result<()>;
    async fn update_quote_status(
        &self,
        quote_number: &str,
        status: QuoteStatus,
    ) -> Result<QuoteRecord>;
    async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<QuoteRecord>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn search_customers(&self, term: &str) -> Result<Vec<CustomerSummary>>;
}

/// Payment edge functions. Stripe itself sits behind these.
#[async_trait]
pub trait PaymentFunctions: Send + Sync {
    async fn create_payment_intent(&self, form: &CheckoutForm) -> Result<CheckoutSession>;
    async fn charge_for_service(
        &self,
        request: &ChargeRequest,
        access_token: &str,
    ) -> Result<ChargeReceipt>;
}
