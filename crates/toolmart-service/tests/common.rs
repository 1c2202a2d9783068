//! Common test utilities for toolmart integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use toolmart_core::DEFAULT_KEY_VALIDITY_DAYS;
use toolmart_service::{create_router, AppState, ServiceConfig};
use toolmart_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Direct handle to the store for invariant assertions.
    pub store: Arc<RocksStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_validity_days(DEFAULT_KEY_VALIDITY_DAYS)
    }

    /// Create a harness with a custom license validity window.
    pub fn with_validity_days(key_validity_days: i64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            key_validity_days,
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            store,
        }
    }

    /// Register a regular user through the API and return its ID.
    pub async fn register_user(&self, name: &str) -> String {
        let response = self
            .server
            .post("/v1/users")
            .json(&json!({ "name": name }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Register an admin user through the API and return its ID.
    pub async fn register_admin(&self, name: &str) -> String {
        let response = self
            .server
            .post("/v1/users")
            .json(&json!({ "name": name, "is_admin": true }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Record a completed deposit for a user.
    pub async fn deposit(&self, user_id: &str, amount_cents: i64) {
        self.server
            .post("/v1/deposit")
            .json(&json!({ "user_id": user_id, "amount_cents": amount_cents }))
            .await
            .assert_status_ok();
    }

    /// List a tool in the catalog and return its ID.
    pub async fn create_tool(&self, admin_id: &str, name: &str, price_cents: i64) -> String {
        let response = self
            .server
            .post("/v1/tools")
            .add_header("x-admin-id", admin_id)
            .json(&json!({ "name": name, "price_cents": price_cents }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Fetch a user's current balance.
    pub async fn balance_of(&self, user_id: &str) -> i64 {
        let response = self.server.get(&format!("/v1/users/{user_id}")).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["balance_cents"].as_i64().unwrap()
    }

    /// Check a license key and return whether it validates.
    pub async fn key_is_valid(&self, key: &str) -> bool {
        let response = self
            .server
            .post("/v1/keys/validate")
            .json(&json!({ "key": key }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["valid"].as_bool().unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
