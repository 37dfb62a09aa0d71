//! Stripe integration for hosted checkout purchases.
//!
//! Confirmation is never taken from the client redirect alone: the
//! session is refetched and `payment_status` must read `paid`.

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::CheckoutSession;
