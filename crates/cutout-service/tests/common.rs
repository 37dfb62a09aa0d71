//! Common test utilities for cutout integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use cutout_core::{Account, UserId};
use cutout_service::crypto::hmac_sha256_base64;
use cutout_service::{create_router, AppState, ServiceConfig};
use cutout_store::{RocksStore, Store};

/// Webhook signing secret used by the harness. The part after `whsec_`
/// is base64 for `test-secret`.
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC1zZWNyZXQ=";

/// The raw key the harness secret decodes to.
pub const WEBHOOK_KEY: &[u8] = b"test-secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and asserting on state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness, letting the test adjust configuration (mock
    /// gateway URLs, API keys) before the router is built.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            clerk_webhook_secret: Some(WEBHOOK_SECRET.into()),
            frontend_url: "http://localhost:5173".into(),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id: "user_test_1".parse().expect("valid user id"),
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Seed an account for the test user and return it.
    pub fn seed_account(&self) -> Account {
        let account = Account::new(self.test_user_id.clone(), "test@example.com");
        self.store
            .create_account_if_absent(&account)
            .expect("seed account");
        account
    }

    /// Build svix-style signature headers for a webhook body.
    pub fn webhook_headers(body: &str) -> Vec<(&'static str, String)> {
        let msg_id = "msg_test_1";
        let timestamp = "1700000000";
        let content = format!("{msg_id}.{timestamp}.{body}");
        let signature = format!("v1,{}", hmac_sha256_base64(WEBHOOK_KEY, content.as_bytes()));

        vec![
            ("svix-id", msg_id.to_string()),
            ("svix-timestamp", timestamp.to_string()),
            ("svix-signature", signature),
        ]
    }

    /// Poll until the predicate returns `Some`, or panic after ~2s. Used
    /// to observe reconciliation that runs after the webhook ack.
    pub async fn wait_for<T>(&self, mut probe: impl FnMut(&RocksStore) -> Option<T>) -> T {
        for _ in 0..100 {
            if let Some(value) = probe(&self.store) {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached within 2s");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
