//! Purchase transaction types.
//!
//! One `Transaction` row records one purchase attempt. It is created before
//! any gateway call and settled at most once; credit reaches the owning
//! account if and only if the settled flag flips false to true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlanTier, TransactionId, UserId};

/// A credit purchase attempt.
///
/// The transaction id is the correlation key handed to the gateway
/// (Razorpay order receipt, Stripe session metadata) and matched back at
/// confirmation time. An abandoned checkout leaves the row unsettled
/// forever, which is harmless: no credit was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id (ULID for time-ordering).
    pub id: TransactionId,

    /// The purchasing user.
    pub user_id: UserId,

    /// The purchased plan.
    pub plan: PlanTier,

    /// Credits granted on settlement (denormalized from the plan table at
    /// creation time).
    pub credit_amount: i64,

    /// Price charged (denormalized from the plan table).
    pub price_amount: i64,

    /// Which gateway handles this purchase.
    pub gateway: Gateway,

    /// Gateway-side reference: Razorpay order id or Stripe checkout session
    /// id. Written after the order-creation call succeeds.
    pub gateway_ref: Option<String>,

    /// Whether payment was confirmed and credit applied. Transitions
    /// false -> true at most once.
    pub settled: bool,

    /// When the purchase intent was recorded.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new unsettled purchase transaction for a plan.
    #[must_use]
    pub fn new(user_id: UserId, plan: PlanTier, gateway: Gateway) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            plan,
            credit_amount: plan.credit_amount(),
            price_amount: plan.price_amount(),
            gateway,
            gateway_ref: None,
            settled: false,
            created_at: Utc::now(),
        }
    }
}

/// The payment gateway that handles a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    /// Hosted-order gateway; confirmation is proof-by-refetch.
    Razorpay,
    /// Hosted-checkout gateway; confirmation is re-validated server-side.
    Stripe,
}

impl Gateway {
    /// Gateway name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::Stripe => "stripe",
        }
    }
}
