//! Cutout HTTP API Service.
//!
//! This crate provides the HTTP API for the cutout service, including:
//!
//! - Credit balance lookup
//! - Identity-provider webhooks (account lifecycle)
//! - Razorpay and Stripe credit purchases
//! - Background removal (metered, 1 credit per image)
//!
//! # Authentication
//!
//! End-user requests carry a Clerk-issued JWT validated against the
//! provider's JWKS. Webhook requests are authenticated by HMAC signature
//! instead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async for consistency

pub mod auth;
pub mod clerk;
pub mod clipdrop;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod razorpay;
pub mod routes;
pub mod state;
pub mod stripe;

pub use clerk::ClerkClient;
pub use clipdrop::ClipdropClient;
pub use config::ServiceConfig;
pub use error::ApiError;
pub use razorpay::RazorpayClient;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::StripeClient;
