//! User account types for toolmart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A marketplace user.
///
/// The balance is an integer count of the smallest currency unit and is
/// mutated only through the ledger operations in the store; every balance
/// change has a corresponding `Payment` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID.
    pub id: UserId,

    /// Display name, reported back by the key-validation endpoint.
    pub name: String,

    /// Current balance in cents. Never negative.
    pub balance_cents: i64,

    /// Whether this user may call admin operations.
    pub is_admin: bool,

    /// When the user registered.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with zero balance.
    #[must_use]
    pub fn new(id: UserId, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            balance_cents: 0,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user can cover a debit of the given amount.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount_cents: i64) -> bool {
        self.balance_cents >= amount_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_zero_balance() {
        let user = User::new(UserId::generate(), "ada".into());
        assert_eq!(user.balance_cents, 0);
        assert!(!user.is_admin);
    }

    #[test]
    fn sufficient_funds_boundary() {
        let mut user = User::new(UserId::generate(), "ada".into());
        user.balance_cents = 1000;

        assert!(user.has_sufficient_funds(500));
        assert!(user.has_sufficient_funds(1000));
        assert!(!user.has_sufficient_funds(1001));
    }
}
