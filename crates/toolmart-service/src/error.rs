//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use toolmart_core::MarketError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient funds.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Amount is not a positive integer number of cents.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Discount code was deactivated.
    #[error("discount code inactive: {0}")]
    DiscountInactive(String),

    /// Discount code expired.
    #[error("discount code expired: {0}")]
    DiscountExpired(String),

    /// Discount code usage limit reached.
    #[error("discount code exhausted: {0}")]
    DiscountExhausted(String),

    /// License key already in use.
    #[error("license key already in use: {0}")]
    DuplicateKey(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                self.to_string(),
                None,
            ),
            Self::DiscountInactive(_) => (
                StatusCode::BAD_REQUEST,
                "discount_inactive",
                self.to_string(),
                None,
            ),
            Self::DiscountExpired(_) => (
                StatusCode::BAD_REQUEST,
                "discount_expired",
                self.to_string(),
                None,
            ),
            Self::DiscountExhausted(_) => (
                StatusCode::BAD_REQUEST,
                "discount_exhausted",
                self.to_string(),
                None,
            ),
            Self::DuplicateKey(key) => (
                StatusCode::CONFLICT,
                "duplicate_key",
                format!("license key {key} is already in use"),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<toolmart_store::StoreError> for ApiError {
    fn from(err: toolmart_store::StoreError) -> Self {
        match err {
            toolmart_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            toolmart_store::StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            toolmart_store::StoreError::InvalidAmount { amount } => Self::InvalidAmount(amount),
            toolmart_store::StoreError::DiscountExhausted { code } => {
                Self::DiscountExhausted(code)
            }
            toolmart_store::StoreError::DuplicateKey { key } => Self::DuplicateKey(key),
            toolmart_store::StoreError::Unauthorized => Self::Forbidden,
            toolmart_store::StoreError::Database(msg)
            | toolmart_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            MarketError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            MarketError::DiscountInactive { code } => Self::DiscountInactive(code),
            MarketError::DiscountExpired { code } => Self::DiscountExpired(code),
            MarketError::DiscountExhausted { code } => Self::DiscountExhausted(code),
            MarketError::DuplicateKey { key } => Self::DuplicateKey(key),
            MarketError::Unauthorized => Self::Forbidden,
            MarketError::UserNotFound { user_id } => {
                Self::NotFound(format!("user not found: {user_id}"))
            }
            MarketError::ToolNotFound { tool_id } => {
                Self::NotFound(format!("tool not found: {tool_id}"))
            }
            MarketError::PurchaseNotFound { purchase_id } => {
                Self::NotFound(format!("purchase not found: {purchase_id}"))
            }
            MarketError::DiscountNotFound { code } => {
                Self::NotFound(format!("discount code not found: {code}"))
            }
            MarketError::InvalidId(e) => Self::BadRequest(e.to_string()),
            MarketError::Storage(msg) | MarketError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
