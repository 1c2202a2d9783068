//! Admin reporting handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use toolmart_core::KeyValidation;
use toolmart_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Key-validation list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListValidationsQuery {
    /// Maximum number of entries to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Key-validation log entry response.
#[derive(Debug, Serialize)]
pub struct KeyValidationResponse {
    /// Log entry ID.
    pub id: String,
    /// The presented key.
    pub key_value: String,
    /// Resolved owner, when the lookup succeeded.
    pub user_id: Option<String>,
    /// Resolved tool, when the lookup succeeded.
    pub tool_id: Option<String>,
    /// Whether the key validated.
    pub is_valid: bool,
    /// Caller IP.
    pub ip_address: String,
    /// Caller user agent.
    pub user_agent: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&KeyValidation> for KeyValidationResponse {
    fn from(validation: &KeyValidation) -> Self {
        Self {
            id: validation.id.to_string(),
            key_value: validation.key_value.clone(),
            user_id: validation.user_id.map(|id| id.to_string()),
            tool_id: validation.tool_id.map(|id| id.to_string()),
            is_valid: validation.is_valid,
            ip_address: validation.ip_address.clone(),
            user_agent: validation.user_agent.clone(),
            created_at: validation.created_at.to_rfc3339(),
        }
    }
}

/// List validations response.
#[derive(Debug, Serialize)]
pub struct ListValidationsResponse {
    /// Log entries, newest first.
    pub validations: Vec<KeyValidationResponse>,
}

/// List recent key-validation attempts (admin only).
pub async fn list_key_validations(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListValidationsQuery>,
) -> Result<Json<ListValidationsResponse>, ApiError> {
    let limit = query.limit.min(200);
    let validations = state.store.list_recent_validations(limit)?;
    let validations = validations.iter().map(KeyValidationResponse::from).collect();

    Ok(Json(ListValidationsResponse { validations }))
}

/// Key-validation counters for today.
#[derive(Debug, Serialize)]
pub struct KeyValidationStats {
    /// All attempts today.
    pub total_today: u64,
    /// Successful attempts today.
    pub success_today: u64,
    /// Failed attempts today.
    pub failed_today: u64,
}

/// Marketplace statistics response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Registered users.
    pub total_users: u64,
    /// Listed tools, active or not.
    pub total_tools: u64,
    /// Revenue this calendar month in cents.
    pub monthly_revenue_cents: i64,
    /// Lifetime revenue in cents.
    pub total_revenue_cents: i64,
    /// Key-validation counters for today.
    pub key_validation: KeyValidationStats,
}

/// Aggregate marketplace statistics (admin only).
pub async fn stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let now = Utc::now();

    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::Internal("invalid day start".into()))?
        .and_utc();
    let month_start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ApiError::Internal("invalid month start".into()))?
        .and_utc();

    let revenue = state.store.revenue_stats(month_start)?;
    let validation = state.store.validation_stats_for_day(today)?;

    Ok(Json(StatsResponse {
        total_users: state.store.count_users()?,
        total_tools: state.store.count_tools()?,
        monthly_revenue_cents: revenue.month_cents,
        total_revenue_cents: revenue.total_cents,
        key_validation: KeyValidationStats {
            total_today: validation.total,
            success_today: validation.success,
            failed_today: validation.failed,
        },
    }))
}
