//! Discount code types and validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::DiscountCodeId;

/// How a discount code reduces a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the base price (0-100).
    Percentage,

    /// `discount_value` is a flat amount in cents, the same minor unit as
    /// tool prices.
    Fixed,
}

/// A redeemable discount code.
///
/// `usage_count` is monotonic: it increments exactly once per successful
/// redemption and never decrements. Whenever `usage_limit` is set,
/// `usage_count <= usage_limit` holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    /// Stable primary key.
    pub id: DiscountCodeId,

    /// The redemption string. Unique, matched case-sensitively.
    pub code: String,

    /// How the discount is applied.
    pub discount_type: DiscountType,

    /// Percentage points for `Percentage`, cents for `Fixed`.
    pub discount_value: i64,

    /// Maximum number of redemptions. `None` means unlimited.
    pub usage_limit: Option<u32>,

    /// Number of successful redemptions so far.
    pub usage_count: u32,

    /// Whether the code is redeemable at all.
    pub is_active: bool,

    /// Redemptions at or after this instant are rejected. `None` means no
    /// expiry.
    pub expires_at: Option<DateTime<Utc>>,

    /// When the code was created.
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    /// Create a new active code with no redemptions.
    #[must_use]
    pub fn new(code: String, discount_type: DiscountType, discount_value: i64) -> Self {
        Self {
            id: DiscountCodeId::generate(),
            code,
            discount_type,
            discount_value,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check whether the code has reached its usage limit.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Validate the code for redemption at `now`.
    ///
    /// Checks run in a fixed order: active flag, then expiry, then usage
    /// limit. The first failed check determines the error. Existence is the
    /// caller's concern (the store lookup happens before this).
    ///
    /// # Errors
    ///
    /// - `MarketError::DiscountInactive` if the code was deactivated.
    /// - `MarketError::DiscountExpired` if `expires_at` is in the past.
    /// - `MarketError::DiscountExhausted` if the usage limit is reached.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if !self.is_active {
            return Err(MarketError::DiscountInactive {
                code: self.code.clone(),
            });
        }

        if self.expires_at.is_some_and(|expires| expires < now) {
            return Err(MarketError::DiscountExpired {
                code: self.code.clone(),
            });
        }

        if self.is_exhausted() {
            return Err(MarketError::DiscountExhausted {
                code: self.code.clone(),
            });
        }

        Ok(())
    }

    /// Compute the discount amount in cents for a base price.
    ///
    /// Percentage discounts floor to whole cents. The result is clamped to
    /// `0..=base_price_cents` so the final price can never go negative.
    #[must_use]
    pub fn compute_discount(&self, base_price_cents: i64) -> i64 {
        let raw = match self.discount_type {
            DiscountType::Percentage => base_price_cents * self.discount_value / 100,
            DiscountType::Fixed => self.discount_value,
        };

        raw.clamp(0, base_price_cents)
    }
}
