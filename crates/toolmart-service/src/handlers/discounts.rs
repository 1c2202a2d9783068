//! Discount code handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use toolmart_core::{DiscountCode, DiscountType};
use toolmart_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Discount code response.
#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    /// Discount code ID.
    pub id: String,
    /// The redemption string.
    pub code: String,
    /// Discount type.
    pub discount_type: DiscountType,
    /// Percentage points or cents, depending on the type.
    pub discount_value: i64,
    /// Maximum redemptions, if capped.
    pub usage_limit: Option<u32>,
    /// Redemptions so far.
    pub usage_count: u32,
    /// Whether the code is redeemable.
    pub is_active: bool,
    /// Expiry, if any.
    pub expires_at: Option<String>,
}

impl From<&DiscountCode> for DiscountResponse {
    fn from(discount: &DiscountCode) -> Self {
        Self {
            id: discount.id.to_string(),
            code: discount.code.clone(),
            discount_type: discount.discount_type,
            discount_value: discount.discount_value,
            usage_limit: discount.usage_limit,
            usage_count: discount.usage_count,
            is_active: discount.is_active,
            expires_at: discount.expires_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Create discount request.
#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    /// The redemption string. Matched case-sensitively.
    pub code: String,
    /// Discount type.
    pub discount_type: DiscountType,
    /// Percentage points for `percentage`, cents for `fixed`.
    pub discount_value: i64,
    /// Maximum redemptions. Omit for unlimited.
    pub usage_limit: Option<u32>,
    /// Expiry. Omit for no expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Create a discount code (admin only).
pub async fn create_discount(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<CreateDiscountRequest>,
) -> Result<Json<DiscountResponse>, ApiError> {
    if body.code.trim().is_empty() {
        return Err(ApiError::BadRequest("code must not be empty".into()));
    }
    if body.discount_value < 0 {
        return Err(ApiError::InvalidAmount(body.discount_value));
    }
    if body.discount_type == DiscountType::Percentage && body.discount_value > 100 {
        return Err(ApiError::BadRequest(
            "percentage discount cannot exceed 100".into(),
        ));
    }

    if state.store.get_discount_by_code(&body.code)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "discount code {} already exists",
            body.code
        )));
    }

    let mut discount = DiscountCode::new(body.code, body.discount_type, body.discount_value);
    discount.usage_limit = body.usage_limit;
    discount.expires_at = body.expires_at;
    state.store.put_discount(&discount)?;

    tracing::info!(
        discount_id = %discount.id,
        code = %discount.code,
        admin_id = %admin.user.id,
        "Discount code created"
    );

    Ok(Json(DiscountResponse::from(&discount)))
}

/// Validate discount request.
#[derive(Debug, Deserialize)]
pub struct ValidateDiscountRequest {
    /// The code to check. Matched case-sensitively.
    pub code: String,
}

/// Validate a discount code without redeeming it.
pub async fn validate_discount(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateDiscountRequest>,
) -> Result<Json<DiscountResponse>, ApiError> {
    let discount = state
        .store
        .get_discount_by_code(&body.code)?
        .ok_or_else(|| ApiError::NotFound(format!("discount code not found: {}", body.code)))?;

    discount.validate(Utc::now())?;

    Ok(Json(DiscountResponse::from(&discount)))
}
