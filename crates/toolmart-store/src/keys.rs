//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families. Entity keys are raw UUID/ULID bytes; index keys
//! concatenate the owner UUID with the row's time-ordered ID so prefix
//! iteration yields a user's rows in chronological order.

use toolmart_core::{DiscountCodeId, PaymentId, PurchaseId, ToolId, UserId};

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a tool key from a tool ID.
#[must_use]
pub fn tool_key(tool_id: &ToolId) -> Vec<u8> {
    tool_id.as_bytes().to_vec()
}

/// Create a discount key from a discount code ID.
#[must_use]
pub fn discount_key(discount_id: &DiscountCodeId) -> Vec<u8> {
    discount_id.as_bytes().to_vec()
}

/// Create a discount-by-code index key. Case-sensitive.
#[must_use]
pub fn discount_code_key(code: &str) -> Vec<u8> {
    code.as_bytes().to_vec()
}

/// Create a purchase key from a purchase ID.
#[must_use]
pub fn purchase_key(purchase_id: &PurchaseId) -> Vec<u8> {
    purchase_id.as_bytes().to_vec()
}

/// Create a purchase-by-license-key index key.
#[must_use]
pub fn license_key_key(key_value: &str) -> Vec<u8> {
    key_value.as_bytes().to_vec()
}

/// Create a user-purchase index key.
///
/// Format: `user_id (16 bytes) || purchase_id (16 bytes)`.
#[must_use]
pub fn user_purchase_key(user_id: &UserId, purchase_id: &PurchaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(purchase_id.as_bytes());
    key
}

/// Create a prefix for iterating all purchases for a user.
#[must_use]
pub fn user_purchases_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the purchase ID from a user-purchase index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_purchase_id_from_user_key(key: &[u8]) -> PurchaseId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    PurchaseId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Create a payment key from a payment ID.
#[must_use]
pub fn payment_key(payment_id: &PaymentId) -> Vec<u8> {
    payment_id.to_bytes().to_vec()
}

/// Create a user-payment index key.
///
/// Format: `user_id (16 bytes) || payment_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, payments for a user will be sorted by time.
#[must_use]
pub fn user_payment_key(user_id: &UserId, payment_id: &PaymentId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&payment_id.to_bytes());
    key
}

/// Create a prefix for iterating all payments for a user.
#[must_use]
pub fn user_payments_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the payment ID from a user-payment index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_payment_id_from_user_key(key: &[u8]) -> PaymentId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    PaymentId::from_bytes(bytes).expect("valid ULID bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_length() {
        let user_id = UserId::generate();
        let key = user_key(&user_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn user_payment_key_format() {
        let user_id = UserId::generate();
        let payment_id = PaymentId::generate();
        let key = user_payment_key(&user_id, &payment_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], payment_id.to_bytes());
    }

    #[test]
    fn extract_payment_id_roundtrip() {
        let user_id = UserId::generate();
        let payment_id = PaymentId::generate();
        let key = user_payment_key(&user_id, &payment_id);

        let extracted = extract_payment_id_from_user_key(&key);
        assert_eq!(extracted, payment_id);
    }

    #[test]
    fn extract_purchase_id_roundtrip() {
        let user_id = UserId::generate();
        let purchase_id = PurchaseId::generate();
        let key = user_purchase_key(&user_id, &purchase_id);

        let extracted = extract_purchase_id_from_user_key(&key);
        assert_eq!(extracted, purchase_id);
    }

    #[test]
    fn discount_code_key_is_case_sensitive() {
        assert_ne!(discount_code_key("SAVE10"), discount_code_key("save10"));
    }
}
