//! Error types for toolmart.

use crate::ids::IdError;

/// Result type for toolmart operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Insufficient balance for the operation.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Amount is not a positive integer number of cents.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// User not found.
    #[error("user not found: {user_id}")]
    UserNotFound {
        /// The user ID that was not found.
        user_id: String,
    },

    /// Tool not found or inactive.
    #[error("tool not found: {tool_id}")]
    ToolNotFound {
        /// The tool ID that was not found.
        tool_id: String,
    },

    /// Purchase not found.
    #[error("purchase not found: {purchase_id}")]
    PurchaseNotFound {
        /// The purchase ID that was not found.
        purchase_id: String,
    },

    /// Discount code does not exist.
    #[error("discount code not found: {code}")]
    DiscountNotFound {
        /// The code that was looked up.
        code: String,
    },

    /// Discount code has been deactivated.
    #[error("discount code inactive: {code}")]
    DiscountInactive {
        /// The rejected code.
        code: String,
    },

    /// Discount code expired before the redemption attempt.
    #[error("discount code expired: {code}")]
    DiscountExpired {
        /// The rejected code.
        code: String,
    },

    /// Discount code has reached its usage limit.
    #[error("discount code exhausted: {code}")]
    DiscountExhausted {
        /// The rejected code.
        code: String,
    },

    /// Acting on a purchase owned by another user.
    #[error("not authorized to act on this purchase")]
    Unauthorized,

    /// License key already in use by another purchase.
    #[error("license key already in use: {key}")]
    DuplicateKey {
        /// The conflicting key value.
        key: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
