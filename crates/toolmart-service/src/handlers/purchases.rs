//! Purchase execution and license rotation handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use toolmart_core::{mint_key, Payment, Purchase, PurchaseId, ToolId, UserId};
use toolmart_store::{Store, StoreError};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// How many times a purchase re-mints after a license key collision.
const MINT_RETRY_LIMIT: usize = 3;

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Purchase ID.
    pub id: String,
    /// Buyer.
    pub user_id: String,
    /// Purchased tool.
    pub tool_id: String,
    /// Tool price snapshot in cents.
    pub price_cents: i64,
    /// Discount applied in cents.
    pub discount_amount_cents: i64,
    /// Amount debited in cents.
    pub final_price_cents: i64,
    /// The license key.
    pub key_value: String,
    /// Whether the license is active.
    pub is_active: bool,
    /// Created timestamp.
    pub created_at: String,
    /// Expiry timestamp.
    pub expires_at: String,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            user_id: purchase.user_id.to_string(),
            tool_id: purchase.tool_id.to_string(),
            price_cents: purchase.price_cents,
            discount_amount_cents: purchase.discount_amount_cents,
            final_price_cents: purchase.final_price_cents,
            key_value: purchase.key_value.clone(),
            is_active: purchase.is_active,
            created_at: purchase.created_at.to_rfc3339(),
            expires_at: purchase.expires_at.to_rfc3339(),
        }
    }
}

/// Create purchase request.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    /// The buyer.
    pub user_id: UserId,
    /// The tool to purchase.
    pub tool_id: ToolId,
    /// Optional discount code, matched case-sensitively.
    pub discount_code: Option<String>,
}

/// Execute a purchase: validate the discount, debit the balance, mint a
/// license key, and persist the purchase in one transaction.
pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let tool = state
        .store
        .get_tool(&body.tool_id)?
        .filter(|tool| tool.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("tool not found: {}", body.tool_id)))?;

    // Validate the discount before touching any state; a rejected code
    // aborts the whole purchase.
    let discount = match &body.discount_code {
        Some(code) => {
            let discount = state.store.get_discount_by_code(code)?.ok_or_else(|| {
                ApiError::NotFound(format!("discount code not found: {code}"))
            })?;
            discount.validate(Utc::now())?;
            Some(discount)
        }
        None => None,
    };

    let discount_amount = discount
        .as_ref()
        .map_or(0, |d| d.compute_discount(tool.price_cents));
    let discount_id = discount.as_ref().map(|d| d.id);

    // Mint and commit; a key collision is retryable by re-minting.
    let mut attempts = 0;
    let purchase = loop {
        let purchase = Purchase::new(
            body.user_id,
            body.tool_id,
            tool.price_cents,
            discount_amount,
            mint_key(),
            state.config.key_validity_days,
        );
        let payment = Payment::purchase(
            body.user_id,
            purchase.final_price_cents,
            format!("Purchased {}", tool.name),
        );

        match state
            .store
            .execute_purchase(&purchase, &payment, discount_id.as_ref())
        {
            Ok(balance) => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    user_id = %body.user_id,
                    tool_id = %body.tool_id,
                    final_price_cents = purchase.final_price_cents,
                    discount_amount_cents = discount_amount,
                    new_balance = balance,
                    "Purchase completed"
                );
                break purchase;
            }
            Err(StoreError::DuplicateKey { .. }) if attempts < MINT_RETRY_LIMIT => {
                attempts += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    Ok(Json(PurchaseResponse::from(&purchase)))
}

/// List a user's purchases.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ListPurchasesResponse>, ApiError> {
    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    let purchases = state.store.list_purchases_by_user(&user_id)?;
    let purchases = purchases.iter().map(PurchaseResponse::from).collect();

    Ok(Json(ListPurchasesResponse { purchases }))
}

/// List purchases response.
#[derive(Debug, Serialize)]
pub struct ListPurchasesResponse {
    /// Purchases, newest first.
    pub purchases: Vec<PurchaseResponse>,
}

/// Revoke a purchase's license (admin only).
pub async fn revoke_purchase(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(purchase_id): Path<PurchaseId>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let purchase = state.store.revoke_purchase(&purchase_id)?;

    tracing::info!(
        purchase_id = %purchase.id,
        admin_id = %admin.user.id,
        "Purchase revoked"
    );

    Ok(Json(PurchaseResponse::from(&purchase)))
}

/// Rotate key request.
#[derive(Debug, Deserialize)]
pub struct RotateKeyRequest {
    /// The acting user; must own the purchase.
    pub user_id: UserId,
    /// The replacement key.
    pub new_key: String,
}

/// Replace a purchase's license key.
pub async fn rotate_key(
    State(state): State<Arc<AppState>>,
    Path(purchase_id): Path<PurchaseId>,
    Json(body): Json<RotateKeyRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    if body.new_key.trim().is_empty() {
        return Err(ApiError::BadRequest("new_key must not be empty".into()));
    }

    let purchase = state
        .store
        .rotate_key(&purchase_id, &body.user_id, &body.new_key)?;

    tracing::info!(
        purchase_id = %purchase.id,
        user_id = %body.user_id,
        "License key rotated"
    );

    Ok(Json(PurchaseResponse::from(&purchase)))
}
