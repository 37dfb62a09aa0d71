//! Clerk integration: webhook signature verification and the Backend API
//! client used as a profile-fetch fallback when a webhook payload carries
//! no usable email address.

pub mod client;
pub mod webhook;

pub use client::{ClerkClient, ClerkError, ClerkUser};
pub use webhook::verify_webhook;
