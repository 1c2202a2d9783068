//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Catalog tools, keyed by `tool_id`.
    pub const TOOLS: &str = "tools";

    /// Discount codes, keyed by `discount_code_id`.
    pub const DISCOUNTS: &str = "discounts";

    /// Index: discount code string -> `discount_code_id` bytes.
    /// The code string is the unique redemption handle.
    pub const DISCOUNTS_BY_CODE: &str = "discounts_by_code";

    /// Purchases, keyed by `purchase_id`.
    pub const PURCHASES: &str = "purchases";

    /// Index: purchases by buyer, keyed by `user_id || purchase_id`.
    /// Value is empty (index only).
    pub const PURCHASES_BY_USER: &str = "purchases_by_user";

    /// Index: license key string -> `purchase_id` bytes.
    /// This index is what enforces key uniqueness.
    pub const PURCHASES_BY_KEY: &str = "purchases_by_key";

    /// Payment audit trail, keyed by `payment_id` (ULID).
    pub const PAYMENTS: &str = "payments";

    /// Index: payments by user, keyed by `user_id || payment_id`.
    /// Value is empty (index only).
    pub const PAYMENTS_BY_USER: &str = "payments_by_user";

    /// Key-validation log, keyed by `validation_id` (ULID).
    pub const KEY_VALIDATIONS: &str = "key_validations";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::TOOLS,
        cf::DISCOUNTS,
        cf::DISCOUNTS_BY_CODE,
        cf::PURCHASES,
        cf::PURCHASES_BY_USER,
        cf::PURCHASES_BY_KEY,
        cf::PAYMENTS,
        cf::PAYMENTS_BY_USER,
        cf::KEY_VALIDATIONS,
    ]
}
