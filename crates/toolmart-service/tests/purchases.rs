//! Purchase flow integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Purchase with discount
// ============================================================================

#[tokio::test]
async fn purchase_with_fixed_discount_scenario() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 100_000).await;
    let tool = harness.create_tool(&admin, "Profiler", 100_000).await;

    harness
        .server
        .post("/v1/discounts")
        .add_header("x-admin-id", admin.as_str())
        .json(&json!({
            "code": "SAVE10",
            "discount_type": "fixed",
            "discount_value": 10_000,
            "usage_limit": 1
        }))
        .await
        .assert_status_ok();

    // Purchase succeeds with the discount applied
    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({
            "user_id": buyer,
            "tool_id": tool,
            "discount_code": "SAVE10"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["price_cents"], 100_000);
    assert_eq!(body["discount_amount_cents"], 10_000);
    assert_eq!(body["final_price_cents"], 90_000);
    assert_eq!(body["is_active"], true);
    assert_eq!(body["key_value"].as_str().unwrap().len(), 16);

    // Exactly the final price was debited
    assert_eq!(harness.balance_of(&buyer).await, 10_000);

    // The audit trail holds the debit
    let response = harness
        .server
        .get(&format!("/v1/users/{buyer}/payments"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let payments = body["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    let debit = payments
        .iter()
        .find(|p| p["payment_type"] == "purchase")
        .unwrap();
    assert_eq!(debit["amount_cents"], -90_000);

    // The code is exhausted now
    let response = harness
        .server
        .post("/v1/discounts/validate")
        .json(&json!({ "code": "SAVE10" }))
        .await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "discount_exhausted");

    // A second purchase with the same code fails without a balance change
    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({
            "user_id": buyer,
            "tool_id": tool,
            "discount_code": "SAVE10"
        }))
        .await;
    response.assert_status_bad_request();
    assert_eq!(harness.balance_of(&buyer).await, 10_000);
}

#[tokio::test]
async fn purchase_with_percentage_discount() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 100_000).await;
    let tool = harness.create_tool(&admin, "Profiler", 100_000).await;

    harness
        .server
        .post("/v1/discounts")
        .add_header("x-admin-id", admin.as_str())
        .json(&json!({
            "code": "TWENTY",
            "discount_type": "percentage",
            "discount_value": 20
        }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({
            "user_id": buyer,
            "tool_id": tool,
            "discount_code": "TWENTY"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["discount_amount_cents"], 20_000);
    assert_eq!(body["final_price_cents"], 80_000);
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn purchase_with_insufficient_funds_changes_nothing() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 500).await;
    let tool = harness.create_tool(&admin, "Profiler", 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({ "user_id": buyer, "tool_id": tool }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["balance"], 500);
    assert_eq!(body["error"]["details"]["required"], 1000);

    // Balance untouched, no purchase row created
    assert_eq!(harness.balance_of(&buyer).await, 500);
    let response = harness
        .server
        .get(&format!("/v1/users/{buyer}/purchases"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["purchases"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_of_unknown_or_retired_tool_fails() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 10_000).await;

    // Unknown tool
    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({
            "user_id": buyer,
            "tool_id": "00000000-0000-4000-8000-000000000000"
        }))
        .await;
    response.assert_status_not_found();

    // Soft-deleted tool
    let tool = harness.create_tool(&admin, "Profiler", 1000).await;
    harness
        .server
        .delete(&format!("/v1/tools/{tool}"))
        .add_header("x-admin-id", admin.as_str())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({ "user_id": buyer, "tool_id": tool }))
        .await;
    response.assert_status_not_found();
    assert_eq!(harness.balance_of(&buyer).await, 10_000);
}

#[tokio::test]
async fn purchase_with_unknown_discount_code_fails() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 10_000).await;
    let tool = harness.create_tool(&admin, "Profiler", 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({
            "user_id": buyer,
            "tool_id": tool,
            "discount_code": "NOPE"
        }))
        .await;

    response.assert_status_not_found();
    assert_eq!(harness.balance_of(&buyer).await, 10_000);
}

// ============================================================================
// Key rotation
// ============================================================================

#[tokio::test]
async fn rotate_key_invalidates_every_previous_key() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    harness.deposit(&buyer, 10_000).await;
    let tool = harness.create_tool(&admin, "Profiler", 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({ "user_id": buyer, "tool_id": tool }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let purchase_id = body["id"].as_str().unwrap().to_string();
    let minted_key = body["key_value"].as_str().unwrap().to_string();

    // Rotate twice
    harness
        .server
        .put(&format!("/v1/purchases/{purchase_id}/key"))
        .json(&json!({ "user_id": buyer, "new_key": "CUSTOMKEY0000001" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .put(&format!("/v1/purchases/{purchase_id}/key"))
        .json(&json!({ "user_id": buyer, "new_key": "CUSTOMKEY0000002" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["key_value"], "CUSTOMKEY0000002");

    // Only the newest key validates
    assert!(!harness.key_is_valid(&minted_key).await);
    assert!(!harness.key_is_valid("CUSTOMKEY0000001").await);
    assert!(harness.key_is_valid("CUSTOMKEY0000002").await);
}

#[tokio::test]
async fn rotate_key_enforces_ownership_and_uniqueness() {
    let harness = TestHarness::new();
    let admin = harness.register_admin("root").await;
    let buyer = harness.register_user("ada").await;
    let stranger = harness.register_user("mallory").await;
    harness.deposit(&buyer, 10_000).await;
    harness.deposit(&stranger, 10_000).await;
    let tool = harness.create_tool(&admin, "Profiler", 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({ "user_id": buyer, "tool_id": tool }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let purchase_id = body["id"].as_str().unwrap().to_string();
    let buyer_key = body["key_value"].as_str().unwrap().to_string();

    // Someone else's purchase cannot be rotated
    let response = harness
        .server
        .put(&format!("/v1/purchases/{purchase_id}/key"))
        .json(&json!({ "user_id": stranger, "new_key": "CUSTOMKEY0000009" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Rotating onto a key already in use is rejected
    let response = harness
        .server
        .post("/v1/purchases")
        .json(&json!({ "user_id": stranger, "tool_id": tool }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let stranger_purchase = body["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .put(&format!("/v1/purchases/{stranger_purchase}/key"))
        .json(&json!({ "user_id": stranger, "new_key": buyer_key }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "duplicate_key");

    // Empty replacement keys are rejected outright
    let response = harness
        .server
        .put(&format!("/v1/purchases/{purchase_id}/key"))
        .json(&json!({ "user_id": buyer, "new_key": "  " }))
        .await;
    response.assert_status_bad_request();
}
