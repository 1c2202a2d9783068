//! External license-key validation handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use toolmart_core::KeyValidation;
use toolmart_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Validate key request.
#[derive(Debug, Deserialize)]
pub struct ValidateKeyRequest {
    /// The presented license key.
    pub key: String,
    /// Caller IP as forwarded by the web layer.
    pub ip_address: Option<String>,
    /// Caller user agent as forwarded by the web layer.
    pub user_agent: Option<String>,
}

/// Validate key response.
///
/// External callers only learn a boolean; a revoked or expired key looks
/// exactly like one that never existed.
#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    /// Whether the key is currently valid.
    pub valid: bool,
    /// Owner display name, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Tool name, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// License expiry, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Check a license key on behalf of a third-party consumer.
///
/// Every attempt is logged, success or failure.
pub async fn validate_key(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>, ApiError> {
    let now = Utc::now();
    let ip_address = body.ip_address.unwrap_or_else(|| "unknown".into());
    let user_agent = body.user_agent.unwrap_or_else(|| "unknown".into());

    let purchase = state
        .store
        .get_purchase_by_key(&body.key)?
        .filter(|purchase| purchase.is_valid(now));

    let Some(purchase) = purchase else {
        state.store.put_key_validation(&KeyValidation::failure(
            body.key.clone(),
            ip_address,
            user_agent,
        ))?;

        tracing::debug!(key = %body.key, "License key rejected");

        return Ok(Json(ValidateKeyResponse {
            valid: false,
            user_name: None,
            tool_name: None,
            expires_at: None,
        }));
    };

    // The purchase row cannot outlive its user and tool rows; missing
    // references mean a corrupted store.
    let user = state
        .store
        .get_user(&purchase.user_id)?
        .ok_or_else(|| ApiError::Internal("purchase references missing user".into()))?;
    let tool = state
        .store
        .get_tool(&purchase.tool_id)?
        .ok_or_else(|| ApiError::Internal("purchase references missing tool".into()))?;

    state.store.put_key_validation(&KeyValidation::success(
        body.key.clone(),
        purchase.user_id,
        purchase.tool_id,
        ip_address,
        user_agent,
    ))?;

    Ok(Json(ValidateKeyResponse {
        valid: true,
        user_name: Some(user.name),
        tool_name: Some(tool.name),
        expires_at: Some(purchase.expires_at.to_rfc3339()),
    }))
}
