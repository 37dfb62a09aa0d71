//! Application state.

use std::sync::Arc;

use cutout_store::RocksStore;

use crate::clerk::ClerkClient;
use crate::clipdrop::ClipdropClient;
use crate::config::ServiceConfig;
use crate::razorpay::RazorpayClient;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Clerk Backend API client for profile fetches (optional).
    pub clerk: Option<Arc<ClerkClient>>,

    /// Razorpay client for hosted orders (optional).
    pub razorpay: Option<Arc<RazorpayClient>>,

    /// Stripe client for hosted checkout (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// ClipDrop client for background removal (optional).
    pub clipdrop: Option<Arc<ClipdropClient>>,
}

impl AppState {
    /// Create a new application state, building clients from configuration.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let clerk = config.clerk_api_key.as_ref().map(|key| {
            tracing::info!(api_url = %config.clerk_api_url, "Clerk API integration enabled");
            Arc::new(ClerkClient::new(&config.clerk_api_url, key))
        });
        if clerk.is_none() {
            tracing::warn!("Clerk API key not configured - profile fetch fallback disabled");
        }

        let razorpay = config
            .razorpay_key_id
            .as_ref()
            .zip(config.razorpay_key_secret.as_ref())
            .map(|(key_id, key_secret)| {
                tracing::info!("Razorpay integration enabled");
                Arc::new(RazorpayClient::new(
                    &config.razorpay_api_url,
                    key_id,
                    key_secret,
                ))
            });
        if razorpay.is_none() {
            tracing::warn!("Razorpay not configured - Razorpay purchases will not be available");
        }

        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(&config.stripe_api_url, key))
        });
        if stripe.is_none() {
            tracing::warn!("Stripe not configured - Stripe purchases will not be available");
        }

        let clipdrop = config.clipdrop_api_key.as_ref().map(|key| {
            tracing::info!("ClipDrop integration enabled");
            Arc::new(ClipdropClient::new(&config.clipdrop_api_url, key))
        });
        if clipdrop.is_none() {
            tracing::warn!("ClipDrop not configured - background removal will not be available");
        }

        Self {
            store,
            config,
            clerk,
            razorpay,
            stripe,
            clipdrop,
        }
    }
}
