//! Razorpay API client implementation.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use super::types::{ErrorResponse, Order};

/// Error type for Razorpay operations.
#[derive(Debug, thiserror::Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Razorpay API returned an error.
    #[error("Razorpay API error: {code} - {description}")]
    Api {
        /// Error code.
        code: String,
        /// Error description.
        description: String,
    },
}

/// Razorpay API client.
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    /// Create a new Razorpay client.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    /// Create an order.
    ///
    /// # Arguments
    ///
    /// * `amount` - Amount in the currency's smallest unit (paise for INR)
    /// * `currency` - Currency code
    /// * `receipt` - Our transaction id, used later to correlate the paid
    ///   order back to its transaction
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError` on transport failure or an API error.
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, RazorpayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Retrieve an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError` on transport failure or an API error.
    pub async fn fetch_order(&self, order_id: &str) -> Result<Order, RazorpayError> {
        let response = self
            .client
            .get(format!("{}/orders/{order_id}", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RazorpayError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ErrorResponse, _> = response.json().await;
        match error_body {
            Ok(envelope) => Err(RazorpayError::Api {
                code: envelope.error.code.unwrap_or_else(|| "unknown".into()),
                description: envelope
                    .error
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            }),
            Err(_) => Err(RazorpayError::Api {
                code: "http_error".into(),
                description: format!("HTTP {status}"),
            }),
        }
    }
}
