//! Error types for toolmart storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier that missed.
        id: String,
    },

    /// Insufficient balance for a debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Ledger amount with the wrong sign or magnitude.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount in cents.
        amount: i64,
    },

    /// Discount code usage limit reached (checked inside the write lock).
    #[error("discount code exhausted: {code}")]
    DiscountExhausted {
        /// The exhausted code.
        code: String,
    },

    /// License key already mapped to another purchase.
    #[error("license key already in use: {key}")]
    DuplicateKey {
        /// The conflicting key value.
        key: String,
    },

    /// Acting on a purchase owned by another user.
    #[error("not authorized to act on this purchase")]
    Unauthorized,
}
