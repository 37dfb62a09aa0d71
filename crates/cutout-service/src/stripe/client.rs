//! Stripe API client implementation.

use std::time::Duration;

use reqwest::Client;

use super::types::{CheckoutSession, StripeErrorResponse};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL (`https://api.stripe.com/v1`)
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Create a Checkout session for a credit purchase.
    ///
    /// # Arguments
    ///
    /// * `product_name` - Display name on the payment page (the plan tier)
    /// * `amount` - Amount in the currency's smallest unit
    /// * `currency` - Currency code
    /// * `transaction_id` - Our transaction id (stored as metadata)
    /// * `success_url` / `cancel_url` - Redirect targets
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on transport failure or an API error.
    pub async fn create_checkout_session(
        &self,
        product_name: &str,
        amount: i64,
        currency: &str,
        transaction_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", transaction_id.to_string()),
            (
                "line_items[0][price_data][currency]",
                currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                product_name.to_string(),
            ),
            ("line_items[0][price_data][unit_amount]", amount.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[transaction_id]", transaction_id.to_string()),
        ];

        tracing::debug!(
            transaction_id = %transaction_id,
            amount = %amount,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Retrieve a Checkout session by ID.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on transport failure or an API error.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{session_id}", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;
        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "http_error".into(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}
