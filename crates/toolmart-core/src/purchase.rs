//! Purchase records binding a user, a tool, a price paid, and a license key.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{PurchaseId, ToolId, UserId};

/// Default license validity window in days.
pub const DEFAULT_KEY_VALIDITY_DAYS: i64 = 30;

/// A completed purchase.
///
/// Immutable once created except for `key_value` (rotatable) and
/// `is_active` (revocable). `final_price_cents` equals the amount debited
/// from the buyer's balance at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// The purchase ID.
    pub id: PurchaseId,

    /// The buyer.
    pub user_id: UserId,

    /// The purchased tool.
    pub tool_id: ToolId,

    /// Tool price in cents, snapshotted at purchase time.
    pub price_cents: i64,

    /// Discount applied in cents. Zero when no code was used.
    pub discount_amount_cents: i64,

    /// `price_cents - discount_amount_cents`, never negative.
    pub final_price_cents: i64,

    /// The license key. Opaque, unique across all purchases.
    pub key_value: String,

    /// Whether the license is active. `false` means revoked.
    pub is_active: bool,

    /// When the purchase was made.
    pub created_at: DateTime<Utc>,

    /// When the license stops validating.
    pub expires_at: DateTime<Utc>,
}

impl Purchase {
    /// Create a new purchase expiring `validity_days` from now.
    #[must_use]
    pub fn new(
        user_id: UserId,
        tool_id: ToolId,
        price_cents: i64,
        discount_amount_cents: i64,
        key_value: String,
        validity_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PurchaseId::generate(),
            user_id,
            tool_id,
            price_cents,
            discount_amount_cents,
            final_price_cents: (price_cents - discount_amount_cents).max(0),
            key_value,
            is_active: true,
            created_at: now,
            expires_at: now + Duration::days(validity_days),
        }
    }

    /// Check whether the license validates at `now`.
    ///
    /// A revoked or expired purchase is indistinguishable from an unknown
    /// key to external callers.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at >= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase(price: i64, discount: i64) -> Purchase {
        Purchase::new(
            UserId::generate(),
            ToolId::generate(),
            price,
            discount,
            "ABCDEF0123456789".into(),
            DEFAULT_KEY_VALIDITY_DAYS,
        )
    }

    #[test]
    fn final_price_subtracts_discount() {
        let p = purchase(100_000, 10_000);
        assert_eq!(p.final_price_cents, 90_000);
    }

    #[test]
    fn final_price_never_negative() {
        let p = purchase(1000, 5000);
        assert_eq!(p.final_price_cents, 0);
    }

    #[test]
    fn expiry_window() {
        let p = purchase(1000, 0);
        assert_eq!(p.expires_at - p.created_at, Duration::days(30));
    }

    #[test]
    fn validity_checks_flag_and_expiry() {
        let mut p = purchase(1000, 0);
        let now = Utc::now();
        assert!(p.is_valid(now));

        assert!(!p.is_valid(p.expires_at + Duration::seconds(1)));

        p.is_active = false;
        assert!(!p.is_valid(now));
    }
}
