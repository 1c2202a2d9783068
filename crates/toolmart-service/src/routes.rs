//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, discounts, health, keys, purchases, tools, users};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for the key-validation endpoint.
/// Third-party consumers poll it at a much higher volume than the rest of
/// the API.
const KEY_VALIDATE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Users & Ledger
/// - `POST /v1/users` - Register user
/// - `GET /v1/users/:id` - Get user and balance
/// - `GET /v1/users/:id/payments` - Payment audit trail
/// - `GET /v1/users/:id/purchases` - Owned purchases
/// - `POST /v1/deposit` - Record a completed deposit
///
/// ## Catalog
/// - `POST /v1/tools` - List a tool (admin)
/// - `GET /v1/tools` - Browse active tools
/// - `GET /v1/tools/:id` - Tool detail (bumps view counter)
/// - `DELETE /v1/tools/:id` - Soft-delete a tool (admin)
///
/// ## Purchases & Discounts
/// - `POST /v1/purchases` - Execute a purchase
/// - `DELETE /v1/purchases/:id` - Revoke a license (admin)
/// - `PUT /v1/purchases/:id/key` - Rotate a license key
/// - `POST /v1/discounts` - Create a discount code (admin)
/// - `POST /v1/discounts/validate` - Validate a discount code
///
/// ## Keys (third-party consumers, higher concurrency limit)
/// - `POST /v1/keys/validate` - Validate a license key
///
/// ## Admin
/// - `GET /v1/admin/key-validations` - Recent validation attempts
/// - `GET /v1/admin/stats` - Marketplace aggregates
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Key validation gets its own concurrency limit: it is the hot path
    // called by external tools, and it must not starve the purchase flow.
    let key_routes = Router::new()
        .route("/validate", post(keys::validate_key))
        .layer(ConcurrencyLimitLayer::new(
            KEY_VALIDATE_MAX_CONCURRENT_REQUESTS,
        ));

    let api_routes = Router::new()
        // Users & ledger
        .route("/users", post(users::register_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/payments", get(users::list_payments))
        .route("/users/:id/purchases", get(purchases::list_purchases))
        .route("/deposit", post(users::deposit))
        // Catalog
        .route("/tools", post(tools::create_tool).get(tools::list_tools))
        .route(
            "/tools/:id",
            get(tools::get_tool).delete(tools::delete_tool),
        )
        // Purchases & discounts
        .route("/purchases", post(purchases::create_purchase))
        .route("/purchases/:id", delete(purchases::revoke_purchase))
        .route("/purchases/:id/key", put(purchases::rotate_key))
        .route("/discounts", post(discounts::create_discount))
        .route("/discounts/validate", post(discounts::validate_discount))
        // Admin reporting
        .route("/admin/key-validations", get(admin::list_key_validations))
        .route("/admin/stats", get(admin::stats))
        // Key routes (with their own concurrency limit)
        .nest("/keys", key_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
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
