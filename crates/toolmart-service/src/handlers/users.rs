//! User registration, balance, and ledger handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use toolmart_core::{Payment, User, UserId};
use toolmart_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current balance in cents.
    pub balance_cents: i64,
    /// Balance formatted as dollars.
    pub balance_formatted: String,
    /// Whether the user is an admin.
    pub is_admin: bool,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    #[allow(clippy::cast_precision_loss)]
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            balance_cents: user.balance_cents,
            balance_formatted: format!("${:.2}", user.balance_cents as f64 / 100.0),
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Register user request.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    /// Display name.
    pub name: String,
    /// Grant the admin capability. Registration itself is handled by the
    /// out-of-scope auth layer; the flag is accepted here because the core
    /// has no other bootstrap path.
    #[serde(default)]
    pub is_admin: bool,
}

/// Register a new user with zero balance.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    let mut user = User::new(UserId::generate(), body.name);
    user.is_admin = body.is_admin;
    state.store.put_user(&user)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(UserResponse::from(&user)))
}

/// Get a user by ID.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Deposit request.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// The user receiving the funds.
    pub user_id: UserId,
    /// Amount in cents. Must be positive.
    pub amount_cents: i64,
    /// Optional description for the audit trail.
    pub description: Option<String>,
}

/// Deposit response.
#[derive(Debug, Serialize)]
pub struct DepositResponse {
    /// New balance in cents.
    pub balance_cents: i64,
    /// The recorded payment ID.
    pub payment_id: String,
}

/// Record an already-completed deposit and credit the balance.
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, ApiError> {
    if body.amount_cents <= 0 {
        return Err(ApiError::InvalidAmount(body.amount_cents));
    }

    let description = body.description.unwrap_or_else(|| "Deposit".into());
    let payment = Payment::deposit(body.user_id, body.amount_cents, description);
    let balance = state.store.credit(&payment)?;

    tracing::info!(
        user_id = %body.user_id,
        amount_cents = body.amount_cents,
        new_balance = balance,
        "Deposit recorded"
    );

    Ok(Json(DepositResponse {
        balance_cents: balance,
        payment_id: payment.id.to_string(),
    }))
}

/// Payment list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Maximum number of payments to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Payment response.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: String,
    /// Amount in cents (positive = credit, negative = debit).
    pub amount_cents: i64,
    /// Payment type.
    pub payment_type: String,
    /// Settlement status.
    pub status: String,
    /// Description.
    pub description: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            amount_cents: payment.amount_cents,
            payment_type: format!("{:?}", payment.payment_type).to_lowercase(),
            status: format!("{:?}", payment.status).to_lowercase(),
            description: payment.description.clone(),
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}

/// List payments response.
#[derive(Debug, Serialize)]
pub struct ListPaymentsResponse {
    /// Payments (newest first).
    pub payments: Vec<PaymentResponse>,
    /// Whether there are more payments.
    pub has_more: bool,
}

/// List a user's payment audit trail.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<ListPaymentsResponse>, ApiError> {
    // Verify the user exists
    state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let payments = state
        .store
        .list_payments_by_user(&user_id, limit + 1, query.offset)?;

    let has_more = payments.len() > limit;
    let payments: Vec<_> = payments
        .iter()
        .take(limit)
        .map(PaymentResponse::from)
        .collect();

    Ok(Json(ListPaymentsResponse { payments, has_more }))
}
