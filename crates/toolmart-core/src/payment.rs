//! Payment audit trail types.
//!
//! Every balance change appends exactly one `Payment` row; the rows are
//! never mutated or deleted. For each user the sum of payment amounts
//! equals the current balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PaymentId, UserId};

/// A single entry in a user's payment audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment ID (ULID for time-ordering).
    pub id: PaymentId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Amount in cents. Positive = credit, negative = debit.
    pub amount_cents: i64,

    /// Type of payment.
    pub payment_type: PaymentType,

    /// Settlement status.
    pub status: PaymentStatus,

    /// Human-readable description.
    pub description: String,

    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Create a deposit payment (positive amount).
    #[must_use]
    pub fn deposit(user_id: UserId, amount_cents: i64, description: String) -> Self {
        Self {
            id: PaymentId::generate(),
            user_id,
            amount_cents,
            payment_type: PaymentType::Deposit,
            status: PaymentStatus::Completed,
            description,
            created_at: Utc::now(),
        }
    }

    /// Create a purchase payment (always negative).
    #[must_use]
    pub fn purchase(user_id: UserId, amount_cents: i64, description: String) -> Self {
        Self {
            id: PaymentId::generate(),
            user_id,
            amount_cents: -amount_cents.abs(),
            payment_type: PaymentType::Purchase,
            status: PaymentStatus::Completed,
            description,
            created_at: Utc::now(),
        }
    }

    /// Create a refund payment (positive amount).
    #[must_use]
    pub fn refund(user_id: UserId, amount_cents: i64, reason: String) -> Self {
        Self {
            id: PaymentId::generate(),
            user_id,
            amount_cents,
            payment_type: PaymentType::Refund,
            status: PaymentStatus::Completed,
            description: reason,
            created_at: Utc::now(),
        }
    }
}

/// Type of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Funds added to the balance.
    Deposit,

    /// Funds deducted for a purchase.
    Purchase,

    /// Funds returned after a revocation.
    Refund,
}

impl PaymentType {
    /// Check if this payment type adds funds (positive amount).
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit | Self::Refund)
    }

    /// Check if this payment type removes funds (negative amount).
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Purchase)
    }
}

/// Settlement status of a payment.
///
/// Deposits are recorded as already-completed; there is no pending state in
/// this core. The enum exists so outer layers have somewhere to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The payment is settled.
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_payment() {
        let user_id = UserId::generate();
        let payment = Payment::deposit(user_id, 50_000, "Deposit $500".into());

        assert_eq!(payment.amount_cents, 50_000);
        assert_eq!(payment.payment_type, PaymentType::Deposit);
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn purchase_payment_is_negative() {
        let user_id = UserId::generate();
        let payment = Payment::purchase(user_id, 90_000, "Purchased Profiler".into());

        assert_eq!(payment.amount_cents, -90_000);
        assert_eq!(payment.payment_type, PaymentType::Purchase);

        // Passing an already-negative amount must not flip the sign back.
        let payment = Payment::purchase(user_id, -90_000, "Purchased Profiler".into());
        assert_eq!(payment.amount_cents, -90_000);
    }

    #[test]
    fn payment_type_credit_debit() {
        assert!(PaymentType::Deposit.is_credit());
        assert!(PaymentType::Refund.is_credit());
        assert!(!PaymentType::Purchase.is_credit());

        assert!(PaymentType::Purchase.is_debit());
        assert!(!PaymentType::Deposit.is_debit());
    }
}
