//! Stripe API types.

use std::collections::HashMap;

use serde::Deserialize;

/// A Stripe Checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`).
    pub id: String,
    /// Hosted payment page URL (present while the session is open).
    #[serde(default)]
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: String,
    /// Session metadata; carries our transaction id.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Whether the session's payment has settled on Stripe's side.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// Stripe error response wrapper.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// The error details.
    pub error: StripeErrorDetails,
}

/// Stripe error details.
#[derive(Debug, Deserialize)]
pub struct StripeErrorDetails {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
