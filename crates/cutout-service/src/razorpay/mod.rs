//! Razorpay integration for hosted credit purchases.
//!
//! Orders carry our transaction id as the `receipt`; confirmation is
//! proof-by-refetch of the order's `paid` status.

pub mod client;
pub mod types;

pub use client::{RazorpayClient, RazorpayError};
pub use types::Order;
