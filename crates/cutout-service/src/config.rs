//! Service configuration.

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/cutout").
    pub data_dir: String,

    /// JWKS URL for JWT validation.
    pub clerk_jwks_url: String,

    /// Expected JWT audience (default: "cutout").
    pub auth_audience: String,

    /// Clerk Backend API base URL (profile fetch fallback).
    pub clerk_api_url: String,

    /// Clerk Backend API secret key (optional).
    pub clerk_api_key: Option<String>,

    /// Clerk webhook signing secret, `whsec_...` (optional).
    pub clerk_webhook_secret: Option<String>,

    /// Razorpay API base URL.
    pub razorpay_api_url: String,

    /// Razorpay key id (optional).
    pub razorpay_key_id: Option<String>,

    /// Razorpay key secret (optional).
    pub razorpay_key_secret: Option<String>,

    /// Stripe API base URL.
    pub stripe_api_url: String,

    /// Stripe secret API key (optional).
    pub stripe_api_key: Option<String>,

    /// ClipDrop API base URL.
    pub clipdrop_api_url: String,

    /// ClipDrop API key (optional).
    pub clipdrop_api_key: Option<String>,

    /// Purchase currency code (default: "INR").
    pub currency: String,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes (default 8 MiB, image uploads).
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: env_or("LISTEN_ADDR", &defaults.listen_addr),
            data_dir: env_or("DATA_DIR", &defaults.data_dir),
            clerk_jwks_url: env_or("CLERK_JWKS_URL", &defaults.clerk_jwks_url),
            auth_audience: env_or("AUTH_AUDIENCE", &defaults.auth_audience),
            clerk_api_url: env_or("CLERK_API_URL", &defaults.clerk_api_url),
            clerk_api_key: std::env::var("CLERK_API_KEY").ok(),
            clerk_webhook_secret: std::env::var("CLERK_WEBHOOK_SECRET").ok(),
            razorpay_api_url: env_or("RAZORPAY_API_URL", &defaults.razorpay_api_url),
            razorpay_key_id: std::env::var("RAZORPAY_KEY_ID").ok(),
            razorpay_key_secret: std::env::var("RAZORPAY_KEY_SECRET").ok(),
            stripe_api_url: env_or("STRIPE_API_URL", &defaults.stripe_api_url),
            stripe_api_key: std::env::var("STRIPE_API_KEY").ok(),
            clipdrop_api_url: env_or("CLIPDROP_API_URL", &defaults.clipdrop_api_url),
            clipdrop_api_key: std::env::var("CLIPDROP_API_KEY").ok(),
            currency: env_or("CURRENCY", &defaults.currency),
            frontend_url: env_or("FRONTEND_URL", &defaults.frontend_url),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/cutout".into(),
            clerk_jwks_url: "https://clerk.example.com/.well-known/jwks.json".into(),
            auth_audience: "cutout".into(),
            clerk_api_url: "https://api.clerk.com/v1".into(),
            clerk_api_key: None,
            clerk_webhook_secret: None,
            razorpay_api_url: "https://api.razorpay.com/v1".into(),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            stripe_api_url: "https://api.stripe.com/v1".into(),
            stripe_api_key: None,
            clipdrop_api_url: "https://clipdrop-api.co".into(),
            clipdrop_api_key: None,
            currency: "INR".into(),
            frontend_url: "http://localhost:5173".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
