//! `RocksDB` storage layer for toolmart.
//!
//! This crate provides persistent storage for users, tools, discount codes,
//! purchases, payments, and key-validation logs using `RocksDB` with column
//! families for efficient indexing.
//!
//! # Architecture
//!
//! Entity records are CBOR-encoded under their ID bytes; secondary indexes
//! (`purchases_by_key`, `payments_by_user`, ...) map lookup handles back to
//! primary keys. Compound operations (debit, purchase execution, key
//! rotation, discount redemption) commit one `WriteBatch` under a
//! store-level write lock, so their check-then-act sections are atomic at
//! the storage layer.
//!
//! # Example
//!
//! ```no_run
//! use toolmart_store::{RocksStore, Store};
//! use toolmart_core::{User, UserId};
//!
//! let store = RocksStore::open("/tmp/toolmart-db").unwrap();
//!
//! let user = User::new(UserId::generate(), "ada".into());
//! store.put_user(&user).unwrap();
//!
//! let retrieved = store.get_user(&user.id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use toolmart_core::{
    DiscountCode, DiscountCodeId, KeyValidation, Payment, Purchase, PurchaseId, Tool, ToolId,
    User, UserId,
};

/// Key-validation counters for one UTC day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    /// All attempts.
    pub total: u64,
    /// Attempts that resolved to a valid key.
    pub success: u64,
    /// Attempts that did not.
    pub failed: u64,
}

/// Revenue aggregates derived from purchase payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueStats {
    /// Lifetime revenue in cents.
    pub total_cents: i64,
    /// Revenue since the given month start, in cents.
    pub month_cents: i64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update a user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Count all registered users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_users(&self) -> Result<u64>;

    // =========================================================================
    // Tool Operations
    // =========================================================================

    /// Insert or update a catalog tool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_tool(&self, tool: &Tool) -> Result<()>;

    /// Get a tool by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_tool(&self, tool_id: &ToolId) -> Result<Option<Tool>>;

    /// List catalog tools, optionally only active ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_tools(&self, active_only: bool) -> Result<Vec<Tool>>;

    /// Count all catalog tools.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_tools(&self) -> Result<u64>;

    /// Bump a tool's view counter and return the updated tool.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the tool doesn't exist.
    fn record_tool_view(&self, tool_id: &ToolId) -> Result<Tool>;

    /// Soft-delete a tool by clearing its active flag.
    ///
    /// The row stays so existing purchases keep resolving. Returns the
    /// updated tool.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the tool doesn't exist.
    fn deactivate_tool(&self, tool_id: &ToolId) -> Result<Tool>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Credit a user's balance, appending the payment row atomically.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the payment amount is not positive.
    /// - `StoreError::NotFound` if the user doesn't exist.
    fn credit(&self, payment: &Payment) -> Result<i64>;

    /// Debit a user's balance, appending the payment row atomically.
    ///
    /// The payment carries a negative amount; the balance guard and the
    /// decrement run in one critical section, so the balance can never go
    /// negative. Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the payment amount is not negative.
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InsufficientFunds` if the balance cannot cover it.
    fn debit(&self, payment: &Payment) -> Result<i64>;

    /// List payments for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_payments_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Payment>>;

    /// Sum all payment amounts for a user (reconciliation).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn sum_payments_by_user(&self, user_id: &UserId) -> Result<i64>;

    /// Aggregate purchase revenue, lifetime and since `month_start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn revenue_stats(&self, month_start: DateTime<Utc>) -> Result<RevenueStats>;

    // =========================================================================
    // Discount Operations
    // =========================================================================

    /// Insert or update a discount code, maintaining the code index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_discount(&self, discount: &DiscountCode) -> Result<()>;

    /// Get a discount code by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_discount(&self, discount_id: &DiscountCodeId) -> Result<Option<DiscountCode>>;

    /// Get a discount code by its redemption string (case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_discount_by_code(&self, code: &str) -> Result<Option<DiscountCode>>;

    /// Consume one use of a discount code.
    ///
    /// The limit check and the increment run in one critical section:
    /// concurrent redemptions of a code at its last remaining use cannot
    /// both succeed. Returns the updated code.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the code doesn't exist.
    /// - `StoreError::DiscountExhausted` if the usage limit is reached.
    fn redeem_discount(&self, discount_id: &DiscountCodeId) -> Result<DiscountCode>;

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    /// Get a purchase by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Purchase>>;

    /// Resolve a license key to its purchase via the key index.
    ///
    /// Returns the purchase regardless of validity; callers apply the
    /// active/expiry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_purchase_by_key(&self, key_value: &str) -> Result<Option<Purchase>>;

    /// List purchases for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_purchases_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>>;

    /// Execute a purchase as one transaction: balance guard + debit +
    /// payment append + bounded discount increment + purchase/key-index
    /// writes.
    ///
    /// Either everything commits or nothing does. Returns the buyer's new
    /// balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user or discount doesn't exist.
    /// - `StoreError::InsufficientFunds` if the balance cannot cover it.
    /// - `StoreError::DiscountExhausted` if the code ran out concurrently.
    /// - `StoreError::DuplicateKey` if the minted key collides.
    fn execute_purchase(
        &self,
        purchase: &Purchase,
        payment: &Payment,
        discount_id: Option<&DiscountCodeId>,
    ) -> Result<i64>;

    /// Revoke a purchase's license by clearing its active flag.
    ///
    /// The key index entry stays; lookups filter on validity. Returns the
    /// updated purchase.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the purchase doesn't exist.
    fn revoke_purchase(&self, purchase_id: &PurchaseId) -> Result<Purchase>;

    /// Replace a purchase's license key, leaving every other field alone.
    ///
    /// Returns the updated purchase.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the purchase doesn't exist.
    /// - `StoreError::Unauthorized` if it belongs to another user.
    /// - `StoreError::DuplicateKey` if the new key is already in use.
    fn rotate_key(
        &self,
        purchase_id: &PurchaseId,
        user_id: &UserId,
        new_key: &str,
    ) -> Result<Purchase>;

    // =========================================================================
    // Key-Validation Log Operations
    // =========================================================================

    /// Append one key-validation attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_key_validation(&self, validation: &KeyValidation) -> Result<()>;

    /// List recent validation attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_recent_validations(&self, limit: usize) -> Result<Vec<KeyValidation>>;

    /// Count validation attempts for the UTC day starting at `day_start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn validation_stats_for_day(&self, day_start: DateTime<Utc>) -> Result<ValidationStats>;
}
