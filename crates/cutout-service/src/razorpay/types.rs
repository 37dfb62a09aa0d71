//! Razorpay API types.

use serde::{Deserialize, Serialize};

/// A Razorpay order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id (`order_...`).
    pub id: String,
    /// Amount in the currency's smallest unit (paise for INR).
    pub amount: i64,
    /// Currency code.
    pub currency: String,
    /// Merchant-supplied correlation key; we set our transaction id here.
    #[serde(default)]
    pub receipt: Option<String>,
    /// Order status: `created`, `attempted` or `paid`.
    pub status: String,
}

impl Order {
    /// Whether the order has been paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }
}

/// Razorpay error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// The error body.
    pub error: ErrorBody,
}

/// Razorpay error body.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}
