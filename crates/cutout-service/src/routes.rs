//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, health, images, payments, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Maximum concurrent requests for the image endpoint. Transforms hold an
/// upstream connection for seconds, so this limit is tighter.
const IMAGE_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## User (Clerk JWT auth)
/// - `GET /api/user/credits` - Current credit balance
/// - `GET /api/user/transactions` - Purchase history
/// - `POST /api/user/pay-razor` - Start a Razorpay purchase
/// - `POST /api/user/verify-razor` - Verify and settle a Razorpay purchase
/// - `POST /api/user/pay-stripe` - Start a Stripe purchase
/// - `POST /api/user/verify-stripe` - Verify and settle a Stripe purchase
///
/// ## Images (Clerk JWT auth, metered)
/// - `POST /api/image/remove-bg` - Remove an image background (1 credit)
///
/// ## Webhooks (signature verification)
/// - `POST /api/user/webhooks` - Clerk identity events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let user_routes = Router::new()
        .route("/credits", get(accounts::get_credits))
        .route("/transactions", get(accounts::list_transactions))
        .route("/pay-razor", post(payments::pay_razorpay))
        .route("/verify-razor", post(payments::verify_razorpay))
        .route("/pay-stripe", post(payments::pay_stripe))
        .route("/verify-stripe", post(payments::verify_stripe))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        // Added after the limit layer: webhook throughput is paced by the
        // provider, not by us.
        .route("/webhooks", post(webhooks::clerk_webhook));

    let image_routes = Router::new()
        .route("/remove-bg", post(images::remove_background))
        .layer(ConcurrencyLimitLayer::new(IMAGE_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/api/user", user_routes)
        .nest("/api/image", image_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
