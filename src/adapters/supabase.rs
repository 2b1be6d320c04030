//! Supabase backend: PostgREST tables for the catalog, quotes and
//! customers, plus the two payment edge functions.

use crate::core::catalog::RawAnode;
use crate::domain::model::{
    Anode, ChargeReceipt, ChargeRequest, CheckoutForm, CheckoutSession, CustomerSummary,
    QuoteFilter, QuoteRecord, QuoteStatus, QuoteStatusChange,
};
use crate::domain::ports::{CatalogSource, CustomerDirectory, PaymentFunctions, QuoteRepository};
use crate::utils::error::{QuoteError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const CUSTOMER_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentIntentBody<'a> {
    form_data: &'a CheckoutForm,
}

#[derive(Serialize)]
struct ViewedStamp {
    viewed_at: DateTime<Utc>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(Duration::from_secs(seconds));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    /// Every call carries the project key; `bearer` is the anon key for
    /// public calls or a staff session token for admin calls.
    fn request(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }
        Err(Self::remote_error(service, response).await)
    }

    /// For calls made with `Prefer: return=minimal`, which have no body.
    async fn expect_success(service: &str, response: Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::remote_error(service, response).await)
    }

    async fn remote_error(service: &str, response: Response) -> QuoteError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                ["error", "message"]
                    .iter()
                    .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .unwrap_or(body);

        tracing::warn!(service, status = status.as_u16(), "Supabase call failed: {}", message);
        QuoteError::RemoteError {
            service: service.to_string(),
            status: status.as_u16(),
            message,
        }
    }
}

/// PostgREST query for `list_quotes`. `to_date` covers the whole day.
fn quote_filter_query(filter: &QuoteFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
    ];
    if let Some(email) = filter.customer_email.as_deref().map(str::trim) {
        if !email.is_empty() {
            query.push(("customer_email", format!("eq.{}", email)));
        }
    }
    if let Some(status) = filter.status {
        query.push(("status", format!("eq.{}", status)));
    }
    if let Some(from) = filter.from_date {
        query.push(("created_at", format!("gte.{}", from)));
    }
    if let Some(to) = filter.to_date {
        match to.checked_add_days(Days::new(1)) {
            Some(next) => query.push(("created_at", format!("lt.{}", next))),
            None => query.push(("created_at", format!("lte.{}", to))),
        }
    }
    query
}

/// Drops characters that would break a PostgREST `or=(...)` filter.
fn search_pattern(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[async_trait]
impl CatalogSource for SupabaseClient {
    async fn load_anodes(&self) -> Result<Vec<Anode>> {
        let url = self.rest_url("anodes_catalog");
        let response = self
            .request(Method::GET, &url, &self.api_key)
            .query(&[("select", "*")])
            .send()
            .await?;
        let rows: Vec<RawAnode> = Self::read_json("anodes_catalog", response).await?;
        tracing::debug!("Fetched {} catalog rows", rows.len());
        Ok(rows.into_iter().filter_map(RawAnode::into_anode).collect())
    }
}

#[async_trait]
impl QuoteRepository for SupabaseClient {
    async fn save_quote(&self, record: &QuoteRecord) -> Result<QuoteRecord> {
        let url = self.rest_url("quotes");
        let response = self
            .request(Method::POST, &url, &self.api_key)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        let mut saved: Vec<QuoteRecord> = Self::read_json("quotes", response).await?;
        if saved.is_empty() {
            return Err(QuoteError::RemoteError {
                service: "quotes".to_string(),
                status: 200,
                message: "insert returned no rows".to_string(),
            });
        }
        tracing::info!(quote_number = %record.quote_number, "Quote saved");
        Ok(saved.swap_remove(0))
    }

    async fn find_quote(&self, quote_number: &str) -> Result<Option<QuoteRecord>> {
        let url = self.rest_url("quotes");
        let filter = format!("eq.{}", quote_number.trim());
        let response = self
            .request(Method::GET, &url, &self.api_key)
            .query(&[("quote_number", filter.as_str()), ("select", "*")])
            .send()
            .await?;
        let rows: Vec<QuoteRecord> = Self::read_json("quotes", response).await?;
        Ok(rows.into_iter().next())
    }

    async fn mark_quote_viewed(&self, quote_number: &str, at: DateTime<Utc>) -> Result<()> {
        let url = self.rest_url("quotes");
        let filter = format!("eq.{}", quote_number.trim());
        let response = self
            .request(Method::PATCH, &url, &self.api_key)
            .header("Prefer", "return=minimal")
            .query(&[("quote_number", filter.as_str()), ("viewed_at", "is.null")])
            .json(&ViewedStamp { viewed_at: at })
            .send()
            .await?;
        Self::expect_success("quotes", response).await
    }

    async fn update_quote_status(
        &self,
        quote_number: &str,
        status: QuoteStatus,
    ) -> Result<QuoteRecord> {
        let url = self.rest_url("quotes");
        let filter = format!("eq.{}", quote_number.trim());
        let change = QuoteStatusChange::new(status, Utc::now());
        let response = self
            .request(Method::PATCH, &url, &self.api_key)
            .header("Prefer", "return=representation")
            .query(&[("quote_number", filter.as_str()), ("select", "*")])
            .json(&change)
            .send()
            .await?;
        let rows: Vec<QuoteRecord> = Self::read_json("quotes", response).await?;
        let record = rows.into_iter().next().ok_or_else(|| {
            QuoteError::validation("quote_number", format!("no quote numbered {}", quote_number))
        })?;
        tracing::info!(quote_number = %record.quote_number, %status, "Quote status updated");
        Ok(record)
    }

    async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<QuoteRecord>> {
        let url = self.rest_url("quotes");
        let response = self
            .request(Method::GET, &url, &self.api_key)
            .query(&quote_filter_query(filter))
            .send()
            .await?;
        let rows: Vec<QuoteRecord> = Self::read_json("quotes", response).await?;
        tracing::debug!("Listed {} quotes", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl CustomerDirectory for SupabaseClient {
    async fn search_customers(&self, term: &str) -> Result<Vec<CustomerSummary>> {
        let pattern = search_pattern(term);
        if pattern.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.rest_url("customers");
        let filter = format!("(name.ilike.*{0}*,email.ilike.*{0}*)", pattern);
        let limit = CUSTOMER_SEARCH_LIMIT.to_string();
        let response = self
            .request(Method::GET, &url, &self.api_key)
            .query(&[
                ("select", "id,name,email,phone,stripe_customer_id"),
                ("or", filter.as_str()),
                ("order", "name.asc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        Self::read_json("customers", response).await
    }
}

#[async_trait]
impl PaymentFunctions for SupabaseClient {
    async fn create_payment_intent(&self, form: &CheckoutForm) -> Result<CheckoutSession> {
        let url = self.function_url("create-payment-intent");
        let response = self
            .request(Method::POST, &url, &self.api_key)
            .json(&PaymentIntentBody { form_data: form })
            .send()
            .await?;
        Self::read_json("create-payment-intent", response).await
    }

    async fn charge_for_service(
        &self,
        request: &ChargeRequest,
        access_token: &str,
    ) -> Result<ChargeReceipt> {
        let url = self.function_url("charge-for-service");
        let response = self
            .request(Method::POST, &url, access_token)
            .json(request)
            .send()
            .await?;
        Self::read_json("charge-for-service", response).await
    }
}
