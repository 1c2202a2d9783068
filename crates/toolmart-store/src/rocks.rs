//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    Options, WriteBatch,
};

use toolmart_core::{
    DiscountCode, DiscountCodeId, KeyValidation, Payment, PaymentType, Purchase, PurchaseId,
    Tool, ToolId, User, UserId, ValidationId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{RevenueStats, Store, ValidationStats};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<rocksdb::MultiThreaded>>,

    // Serializes every read-check-write mutation (balance guard, bounded
    // discount increment, key-index swap). Batches are atomic on disk but
    // do not re-check guards; the lock makes check and commit one section.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Acquire the mutation lock.
    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Fetch a required user row.
    fn require_user(&self, user_id: &UserId) -> Result<User> {
        self.get_user(user_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })
    }

    /// Count the rows of a column family.
    fn count_cf(&self, name: &str) -> Result<u64> {
        let cf = self.cf(name)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item.map_err(|e| StoreError::Database(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    /// Append a payment and apply its delta to the user inside `batch`.
    ///
    /// The caller holds the write lock and has already applied the balance
    /// policy; this only stages the writes.
    fn stage_payment(&self, batch: &mut WriteBatch, user: &User, payment: &Payment) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_payments = self.cf(cf::PAYMENTS)?;
        let cf_by_user = self.cf(cf::PAYMENTS_BY_USER)?;

        batch.put_cf(&cf_users, keys::user_key(&user.id), Self::serialize(user)?);
        batch.put_cf(
            &cf_payments,
            keys::payment_key(&payment.id),
            Self::serialize(payment)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_payment_key(&payment.user_id, &payment.id),
            [], // Index entry (empty value)
        );
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .put_cf(&cf, keys::user_key(&user.id), Self::serialize(user)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn count_users(&self) -> Result<u64> {
        self.count_cf(cf::USERS)
    }

    // =========================================================================
    // Tool Operations
    // =========================================================================

    fn put_tool(&self, tool: &Tool) -> Result<()> {
        let cf = self.cf(cf::TOOLS)?;
        self.db
            .put_cf(&cf, keys::tool_key(&tool.id), Self::serialize(tool)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_tool(&self, tool_id: &ToolId) -> Result<Option<Tool>> {
        let cf = self.cf(cf::TOOLS)?;
        self.db
            .get_cf(&cf, keys::tool_key(tool_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_tools(&self, active_only: bool) -> Result<Vec<Tool>> {
        let cf = self.cf(cf::TOOLS)?;
        let mut tools = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let tool: Tool = Self::deserialize(&value)?;
            if !active_only || tool.is_active {
                tools.push(tool);
            }
        }

        // UUID keys iterate in random order; present newest listings first.
        tools.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tools)
    }

    fn count_tools(&self) -> Result<u64> {
        self.count_cf(cf::TOOLS)
    }

    fn record_tool_view(&self, tool_id: &ToolId) -> Result<Tool> {
        let _guard = self.lock()?;

        let mut tool = self.get_tool(tool_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "tool",
            id: tool_id.to_string(),
        })?;

        tool.record_view();
        self.put_tool(&tool)?;
        Ok(tool)
    }

    fn deactivate_tool(&self, tool_id: &ToolId) -> Result<Tool> {
        let _guard = self.lock()?;

        let mut tool = self.get_tool(tool_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "tool",
            id: tool_id.to_string(),
        })?;

        tool.is_active = false;
        tool.updated_at = Utc::now();
        self.put_tool(&tool)?;
        Ok(tool)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn credit(&self, payment: &Payment) -> Result<i64> {
        if payment.amount_cents <= 0 {
            return Err(StoreError::InvalidAmount {
                amount: payment.amount_cents,
            });
        }

        let _guard = self.lock()?;

        let mut user = self.require_user(&payment.user_id)?;
        user.balance_cents += payment.amount_cents;
        user.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_payment(&mut batch, &user, payment)?;
        self.write(batch)?;

        Ok(user.balance_cents)
    }

    fn debit(&self, payment: &Payment) -> Result<i64> {
        if payment.amount_cents >= 0 {
            return Err(StoreError::InvalidAmount {
                amount: payment.amount_cents,
            });
        }

        let _guard = self.lock()?;

        let mut user = self.require_user(&payment.user_id)?;
        let required = -payment.amount_cents;
        if !user.has_sufficient_funds(required) {
            return Err(StoreError::InsufficientFunds {
                balance: user.balance_cents,
                required,
            });
        }

        user.balance_cents -= required;
        user.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_payment(&mut batch, &user, payment)?;
        self.write(batch)?;

        Ok(user.balance_cents)
    }

    fn list_payments_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Payment>> {
        let cf_by_user = self.cf(cf::PAYMENTS_BY_USER)?;
        let cf_payments = self.cf(cf::PAYMENTS)?;
        let prefix = keys::user_payments_prefix(user_id);

        // ULID suffixes are time-ordered, so forward iteration over the
        // prefix yields oldest first; collect and reverse for newest first.
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut payments = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if payments.len() >= limit {
                break;
            }

            let payment_id = keys::extract_payment_id_from_user_key(&key);
            let data = self
                .db
                .get_cf(&cf_payments, keys::payment_key(&payment_id))
                .map_err(|e| StoreError::Database(e.to_string()))?;
            if let Some(data) = data {
                payments.push(Self::deserialize(&data)?);
            }
        }

        Ok(payments)
    }

    fn sum_payments_by_user(&self, user_id: &UserId) -> Result<i64> {
        let cf_by_user = self.cf(cf::PAYMENTS_BY_USER)?;
        let cf_payments = self.cf(cf::PAYMENTS)?;
        let prefix = keys::user_payments_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut sum = 0;
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }

            let payment_id = keys::extract_payment_id_from_user_key(&key);
            let data = self
                .db
                .get_cf(&cf_payments, keys::payment_key(&payment_id))
                .map_err(|e| StoreError::Database(e.to_string()))?;
            if let Some(data) = data {
                let payment: Payment = Self::deserialize(&data)?;
                sum += payment.amount_cents;
            }
        }

        Ok(sum)
    }

    fn revenue_stats(&self, month_start: DateTime<Utc>) -> Result<RevenueStats> {
        let cf = self.cf(cf::PAYMENTS)?;
        let mut stats = RevenueStats::default();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let payment: Payment = Self::deserialize(&value)?;

            if payment.payment_type != PaymentType::Purchase {
                continue;
            }

            let revenue = -payment.amount_cents;
            stats.total_cents += revenue;
            if payment.created_at >= month_start {
                stats.month_cents += revenue;
            }
        }

        Ok(stats)
    }

    // =========================================================================
    // Discount Operations
    // =========================================================================

    fn put_discount(&self, discount: &DiscountCode) -> Result<()> {
        let cf_discounts = self.cf(cf::DISCOUNTS)?;
        let cf_by_code = self.cf(cf::DISCOUNTS_BY_CODE)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_discounts,
            keys::discount_key(&discount.id),
            Self::serialize(discount)?,
        );
        batch.put_cf(
            &cf_by_code,
            keys::discount_code_key(&discount.code),
            discount.id.as_bytes(),
        );
        self.write(batch)
    }

    fn get_discount(&self, discount_id: &DiscountCodeId) -> Result<Option<DiscountCode>> {
        let cf = self.cf(cf::DISCOUNTS)?;
        self.db
            .get_cf(&cf, keys::discount_key(discount_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_discount_by_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        let cf_by_code = self.cf(cf::DISCOUNTS_BY_CODE)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_by_code, keys::discount_code_key(code))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Serialization("malformed discount index entry".into()))?;
        self.get_discount(&DiscountCodeId::from_uuid(uuid::Uuid::from_bytes(bytes)))
    }

    fn redeem_discount(&self, discount_id: &DiscountCodeId) -> Result<DiscountCode> {
        let _guard = self.lock()?;

        let mut discount =
            self.get_discount(discount_id)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "discount code",
                    id: discount_id.to_string(),
                })?;

        if discount.is_exhausted() {
            return Err(StoreError::DiscountExhausted {
                code: discount.code.clone(),
            });
        }

        discount.usage_count += 1;
        self.put_discount(&discount)?;
        Ok(discount)
    }

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Purchase>> {
        let cf = self.cf(cf::PURCHASES)?;
        self.db
            .get_cf(&cf, keys::purchase_key(purchase_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_purchase_by_key(&self, key_value: &str) -> Result<Option<Purchase>> {
        let cf_by_key = self.cf(cf::PURCHASES_BY_KEY)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_by_key, keys::license_key_key(key_value))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Serialization("malformed key index entry".into()))?;
        self.get_purchase(&PurchaseId::from_uuid(uuid::Uuid::from_bytes(bytes)))
    }

    fn list_purchases_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>> {
        let cf_by_user = self.cf(cf::PURCHASES_BY_USER)?;
        let prefix = keys::user_purchases_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut purchases = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }

            let purchase_id = keys::extract_purchase_id_from_user_key(&key);
            if let Some(purchase) = self.get_purchase(&purchase_id)? {
                purchases.push(purchase);
            }
        }

        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }

    fn execute_purchase(
        &self,
        purchase: &Purchase,
        payment: &Payment,
        discount_id: Option<&DiscountCodeId>,
    ) -> Result<i64> {
        // The payment must debit exactly the purchase's final price
        // (ledger-purchase consistency). Zero is allowed for fully
        // discounted purchases.
        if payment.amount_cents > 0 || -payment.amount_cents != purchase.final_price_cents {
            return Err(StoreError::InvalidAmount {
                amount: payment.amount_cents,
            });
        }

        let _guard = self.lock()?;

        if self.get_purchase_by_key(&purchase.key_value)?.is_some() {
            return Err(StoreError::DuplicateKey {
                key: purchase.key_value.clone(),
            });
        }

        let mut user = self.require_user(&purchase.user_id)?;
        let required = purchase.final_price_cents;
        if !user.has_sufficient_funds(required) {
            return Err(StoreError::InsufficientFunds {
                balance: user.balance_cents,
                required,
            });
        }

        // Re-check the usage limit inside the lock so the increment stays
        // bounded under concurrent redemptions.
        let redeemed = match discount_id {
            Some(id) => {
                let mut discount =
                    self.get_discount(id)?.ok_or_else(|| StoreError::NotFound {
                        entity: "discount code",
                        id: id.to_string(),
                    })?;
                if discount.is_exhausted() {
                    return Err(StoreError::DiscountExhausted {
                        code: discount.code.clone(),
                    });
                }
                discount.usage_count += 1;
                Some(discount)
            }
            None => None,
        };

        user.balance_cents -= required;
        user.updated_at = Utc::now();

        let cf_purchases = self.cf(cf::PURCHASES)?;
        let cf_by_user = self.cf(cf::PURCHASES_BY_USER)?;
        let cf_by_key = self.cf(cf::PURCHASES_BY_KEY)?;

        let mut batch = WriteBatch::default();
        self.stage_payment(&mut batch, &user, payment)?;

        if let Some(discount) = &redeemed {
            let cf_discounts = self.cf(cf::DISCOUNTS)?;
            let cf_by_code = self.cf(cf::DISCOUNTS_BY_CODE)?;
            batch.put_cf(
                &cf_discounts,
                keys::discount_key(&discount.id),
                Self::serialize(discount)?,
            );
            batch.put_cf(
                &cf_by_code,
                keys::discount_code_key(&discount.code),
                discount.id.as_bytes(),
            );
        }

        batch.put_cf(
            &cf_purchases,
            keys::purchase_key(&purchase.id),
            Self::serialize(purchase)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_purchase_key(&purchase.user_id, &purchase.id),
            [],
        );
        batch.put_cf(
            &cf_by_key,
            keys::license_key_key(&purchase.key_value),
            purchase.id.as_bytes(),
        );

        self.write(batch)?;

        tracing::debug!(
            purchase_id = %purchase.id,
            user_id = %purchase.user_id,
            final_price_cents = purchase.final_price_cents,
            "Purchase committed"
        );

        Ok(user.balance_cents)
    }

    fn revoke_purchase(&self, purchase_id: &PurchaseId) -> Result<Purchase> {
        let _guard = self.lock()?;

        let mut purchase =
            self.get_purchase(purchase_id)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "purchase",
                    id: purchase_id.to_string(),
                })?;

        purchase.is_active = false;

        let cf = self.cf(cf::PURCHASES)?;
        self.db
            .put_cf(
                &cf,
                keys::purchase_key(&purchase.id),
                Self::serialize(&purchase)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(purchase)
    }

    fn rotate_key(
        &self,
        purchase_id: &PurchaseId,
        user_id: &UserId,
        new_key: &str,
    ) -> Result<Purchase> {
        let _guard = self.lock()?;

        let mut purchase =
            self.get_purchase(purchase_id)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "purchase",
                    id: purchase_id.to_string(),
                })?;

        if purchase.user_id != *user_id {
            return Err(StoreError::Unauthorized);
        }

        if let Some(existing) = self.get_purchase_by_key(new_key)? {
            if existing.id != purchase.id {
                return Err(StoreError::DuplicateKey {
                    key: new_key.to_string(),
                });
            }
        }

        let cf_purchases = self.cf(cf::PURCHASES)?;
        let cf_by_key = self.cf(cf::PURCHASES_BY_KEY)?;

        let old_key = std::mem::replace(&mut purchase.key_value, new_key.to_string());

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_by_key, keys::license_key_key(&old_key));
        batch.put_cf(
            &cf_by_key,
            keys::license_key_key(new_key),
            purchase.id.as_bytes(),
        );
        batch.put_cf(
            &cf_purchases,
            keys::purchase_key(&purchase.id),
            Self::serialize(&purchase)?,
        );
        self.write(batch)?;

        Ok(purchase)
    }

    // =========================================================================
    // Key-Validation Log Operations
    // =========================================================================

    fn put_key_validation(&self, validation: &KeyValidation) -> Result<()> {
        let cf = self.cf(cf::KEY_VALIDATIONS)?;
        self.db
            .put_cf(
                &cf,
                validation.id.to_bytes(),
                Self::serialize(validation)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn list_recent_validations(&self, limit: usize) -> Result<Vec<KeyValidation>> {
        let cf = self.cf(cf::KEY_VALIDATIONS)?;

        // ULID keys are time-ordered; iterating from the end gives newest
        // first directly.
        let mut validations = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::End) {
            if validations.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            validations.push(Self::deserialize(&value)?);
        }

        Ok(validations)
    }

    fn validation_stats_for_day(&self, day_start: DateTime<Utc>) -> Result<ValidationStats> {
        let cf = self.cf(cf::KEY_VALIDATIONS)?;

        let start_ms = u64::try_from(day_start.timestamp_millis()).unwrap_or(0);
        let end_ms = start_ms + 24 * 60 * 60 * 1000;
        let lower = ValidationId::lower_bound(start_ms).to_bytes();
        let upper = ValidationId::lower_bound(end_ms).to_bytes();

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&lower, Direction::Forward));

        let mut stats = ValidationStats::default();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if key.as_ref() >= upper.as_slice() {
                break;
            }

            let validation: KeyValidation = Self::deserialize(&value)?;
            stats.total += 1;
            if validation.is_valid {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;
    use toolmart_core::{mint_key, DiscountType, DEFAULT_KEY_VALIDITY_DAYS};

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn seeded_user(store: &RocksStore, balance_cents: i64) -> User {
        let mut user = User::new(UserId::generate(), "ada".into());
        user.balance_cents = balance_cents;
        store.put_user(&user).unwrap();
        user
    }

    fn purchase_row(user: &User, tool: &Tool, discount_cents: i64) -> Purchase {
        Purchase::new(
            user.id,
            tool.id,
            tool.price_cents,
            discount_cents,
            mint_key(),
            DEFAULT_KEY_VALIDITY_DAYS,
        )
    }

    #[test]
    fn user_crud() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 5000);

        let retrieved = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(retrieved.balance_cents, 5000);
        assert_eq!(store.count_users().unwrap(), 1);
        assert!(store.get_user(&UserId::generate()).unwrap().is_none());
    }

    #[test]
    fn tool_listing_and_views() {
        let (store, _dir) = create_test_store();

        let active = Tool::new("Profiler".into(), 4900);
        let mut retired = Tool::new("Old Linter".into(), 1900);
        retired.is_active = false;
        store.put_tool(&active).unwrap();
        store.put_tool(&retired).unwrap();

        assert_eq!(store.list_tools(true).unwrap().len(), 1);
        assert_eq!(store.list_tools(false).unwrap().len(), 2);
        assert_eq!(store.count_tools().unwrap(), 2);

        let viewed = store.record_tool_view(&active.id).unwrap();
        assert_eq!(viewed.view_count, 1);

        let deactivated = store.deactivate_tool(&active.id).unwrap();
        assert!(!deactivated.is_active);
        assert!(store.list_tools(true).unwrap().is_empty());
    }

    #[test]
    fn revoked_purchase_keeps_its_row() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 10_000);
        let tool = Tool::new("Profiler".into(), 1000);
        store.put_tool(&tool).unwrap();

        let purchase = purchase_row(&user, &tool, 0);
        let payment = Payment::purchase(user.id, purchase.final_price_cents, "Buy".into());
        store.execute_purchase(&purchase, &payment, None).unwrap();

        let revoked = store.revoke_purchase(&purchase.id).unwrap();
        assert!(!revoked.is_active);
        assert!(!revoked.is_valid(Utc::now()));

        // The row and its key index survive; validity filtering is the
        // caller's policy.
        let resolved = store.get_purchase_by_key(&purchase.key_value).unwrap();
        assert!(resolved.is_some_and(|p| !p.is_active));
    }

    #[test]
    fn balance_reconciles_with_payments() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 0);

        store
            .credit(&Payment::deposit(user.id, 100_000, "Deposit".into()))
            .unwrap();
        store
            .debit(&Payment::purchase(user.id, 30_000, "Purchase A".into()))
            .unwrap();
        let balance = store
            .credit(&Payment::refund(user.id, 5_000, "Partial refund".into()))
            .unwrap();

        assert_eq!(balance, 75_000);
        assert_eq!(store.sum_payments_by_user(&user.id).unwrap(), 75_000);
        assert_eq!(
            store.get_user(&user.id).unwrap().unwrap().balance_cents,
            75_000
        );
    }

    #[test]
    fn debit_never_goes_negative() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 500);

        let result = store.debit(&Payment::purchase(user.id, 1000, "Too big".into()));
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                balance: 500,
                required: 1000
            })
        ));

        // Balance untouched, no audit row written.
        assert_eq!(store.get_user(&user.id).unwrap().unwrap().balance_cents, 500);
        assert!(store
            .list_payments_by_user(&user.id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn ledger_rejects_bad_amounts() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 1000);

        let mut zero = Payment::deposit(user.id, 0, "Zero".into());
        assert!(matches!(
            store.credit(&zero),
            Err(StoreError::InvalidAmount { amount: 0 })
        ));

        zero.amount_cents = -100;
        assert!(matches!(
            store.credit(&zero),
            Err(StoreError::InvalidAmount { amount: -100 })
        ));

        let mut positive = Payment::purchase(user.id, 100, "Debit".into());
        positive.amount_cents = 100;
        assert!(matches!(
            store.debit(&positive),
            Err(StoreError::InvalidAmount { amount: 100 })
        ));
    }

    #[test]
    fn payments_listed_newest_first_with_pagination() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 0);

        store
            .credit(&Payment::deposit(user.id, 1000, "Deposit 1".into()))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs
        store
            .credit(&Payment::deposit(user.id, 2000, "Deposit 2".into()))
            .unwrap();

        let payments = store.list_payments_by_user(&user.id, 10, 0).unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].description, "Deposit 2"); // Newest first
        assert_eq!(payments[1].description, "Deposit 1");

        let page1 = store.list_payments_by_user(&user.id, 1, 0).unwrap();
        let page2 = store.list_payments_by_user(&user.id, 1, 1).unwrap();
        assert_eq!(page1[0].description, "Deposit 2");
        assert_eq!(page2[0].description, "Deposit 1");
    }

    #[test]
    fn discount_code_lookup_is_case_sensitive() {
        let (store, _dir) = create_test_store();
        let code = DiscountCode::new("SAVE10".into(), DiscountType::Fixed, 10_000);
        store.put_discount(&code).unwrap();

        assert!(store.get_discount_by_code("SAVE10").unwrap().is_some());
        assert!(store.get_discount_by_code("save10").unwrap().is_none());
    }

    #[test]
    fn discount_redemption_is_bounded() {
        let (store, _dir) = create_test_store();
        let mut code = DiscountCode::new("LIMIT3".into(), DiscountType::Percentage, 10);
        code.usage_limit = Some(3);
        store.put_discount(&code).unwrap();

        for expected in 1..=3 {
            let redeemed = store.redeem_discount(&code.id).unwrap();
            assert_eq!(redeemed.usage_count, expected);
        }

        let result = store.redeem_discount(&code.id);
        assert!(matches!(result, Err(StoreError::DiscountExhausted { .. })));

        // The failed attempt must not have bumped the counter.
        let stored = store.get_discount(&code.id).unwrap().unwrap();
        assert_eq!(stored.usage_count, 3);
    }

    #[test]
    fn execute_purchase_commits_everything_atomically() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 100_000);
        let tool = Tool::new("Profiler".into(), 100_000);
        store.put_tool(&tool).unwrap();

        let mut code = DiscountCode::new("SAVE10".into(), DiscountType::Fixed, 10_000);
        code.usage_limit = Some(1);
        store.put_discount(&code).unwrap();

        let discount_amount = code.compute_discount(tool.price_cents);
        let purchase = purchase_row(&user, &tool, discount_amount);
        let payment = Payment::purchase(
            user.id,
            purchase.final_price_cents,
            format!("Purchased {}", tool.name),
        );

        let balance = store
            .execute_purchase(&purchase, &payment, Some(&code.id))
            .unwrap();

        assert_eq!(purchase.final_price_cents, 90_000);
        assert_eq!(balance, 10_000);
        assert_eq!(store.sum_payments_by_user(&user.id).unwrap(), -90_000);
        assert_eq!(
            store.get_discount(&code.id).unwrap().unwrap().usage_count,
            1
        );
        assert!(store
            .get_purchase_by_key(&purchase.key_value)
            .unwrap()
            .is_some());

        // Second purchase with the exhausted code fails without touching
        // the remaining balance.
        let purchase2 = purchase_row(&user, &tool, discount_amount);
        let payment2 = Payment::purchase(user.id, purchase2.final_price_cents, "Again".into());
        let result = store.execute_purchase(&purchase2, &payment2, Some(&code.id));
        assert!(matches!(result, Err(StoreError::DiscountExhausted { .. })));
        assert_eq!(
            store.get_user(&user.id).unwrap().unwrap().balance_cents,
            10_000
        );
    }

    #[test]
    fn execute_purchase_insufficient_funds_leaves_no_trace() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 500);
        let tool = Tool::new("Profiler".into(), 1000);
        store.put_tool(&tool).unwrap();

        let purchase = purchase_row(&user, &tool, 0);
        let payment = Payment::purchase(user.id, purchase.final_price_cents, "Attempt".into());

        let result = store.execute_purchase(&purchase, &payment, None);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                balance: 500,
                required: 1000
            })
        ));

        assert_eq!(store.get_user(&user.id).unwrap().unwrap().balance_cents, 500);
        assert!(store.get_purchase(&purchase.id).unwrap().is_none());
        assert!(store
            .list_payments_by_user(&user.id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn execute_purchase_rejects_colliding_key() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 10_000);
        let tool = Tool::new("Profiler".into(), 1000);
        store.put_tool(&tool).unwrap();

        let first = purchase_row(&user, &tool, 0);
        let payment = Payment::purchase(user.id, first.final_price_cents, "First".into());
        store.execute_purchase(&first, &payment, None).unwrap();

        let mut second = purchase_row(&user, &tool, 0);
        second.key_value.clone_from(&first.key_value);
        let payment = Payment::purchase(user.id, second.final_price_cents, "Second".into());

        let result = store.execute_purchase(&second, &payment, None);
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[test]
    fn rotate_key_swaps_lookup() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 10_000);
        let tool = Tool::new("Profiler".into(), 1000);
        store.put_tool(&tool).unwrap();

        let purchase = purchase_row(&user, &tool, 0);
        let payment = Payment::purchase(user.id, purchase.final_price_cents, "Buy".into());
        store.execute_purchase(&purchase, &payment, None).unwrap();
        let original_key = purchase.key_value.clone();

        // Rotate twice; only the newest key resolves.
        let middle_key = mint_key();
        store
            .rotate_key(&purchase.id, &user.id, &middle_key)
            .unwrap();
        let final_key = mint_key();
        let rotated = store
            .rotate_key(&purchase.id, &user.id, &final_key)
            .unwrap();

        assert_eq!(rotated.key_value, final_key);
        assert_eq!(rotated.final_price_cents, purchase.final_price_cents);
        assert_eq!(rotated.expires_at, purchase.expires_at);
        assert!(store.get_purchase_by_key(&original_key).unwrap().is_none());
        assert!(store.get_purchase_by_key(&middle_key).unwrap().is_none());
        assert!(store.get_purchase_by_key(&final_key).unwrap().is_some());
    }

    #[test]
    fn rotate_key_enforces_ownership_and_uniqueness() {
        let (store, _dir) = create_test_store();
        let user = seeded_user(&store, 10_000);
        let other = seeded_user(&store, 10_000);
        let tool = Tool::new("Profiler".into(), 1000);
        store.put_tool(&tool).unwrap();

        let mine = purchase_row(&user, &tool, 0);
        let payment = Payment::purchase(user.id, mine.final_price_cents, "Buy".into());
        store.execute_purchase(&mine, &payment, None).unwrap();

        let theirs = purchase_row(&other, &tool, 0);
        let payment = Payment::purchase(other.id, theirs.final_price_cents, "Buy".into());
        store.execute_purchase(&theirs, &payment, None).unwrap();

        let result = store.rotate_key(&mine.id, &other.id, &mint_key());
        assert!(matches!(result, Err(StoreError::Unauthorized)));

        let result = store.rotate_key(&mine.id, &user.id, &theirs.key_value);
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));

        let result = store.rotate_key(&PurchaseId::generate(), &user.id, &mint_key());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn validation_log_recency_and_day_stats() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let tool_id = ToolId::generate();

        store
            .put_key_validation(&KeyValidation::failure(
                "BOGUS".into(),
                "10.0.0.1".into(),
                "curl/8".into(),
            ))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store
            .put_key_validation(&KeyValidation::success(
                mint_key(),
                user_id,
                tool_id,
                "10.0.0.2".into(),
                "curl/8".into(),
            ))
            .unwrap();

        let recent = store.list_recent_validations(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].is_valid); // Newest first
        assert!(!recent[1].is_valid);

        let limited = store.list_recent_validations(1).unwrap();
        assert_eq!(limited.len(), 1);
        assert!(limited[0].is_valid);

        let today = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let stats = store.validation_stats_for_day(today).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.failed, 1);

        let yesterday = today - Duration::days(1);
        let stats = store.validation_stats_for_day(yesterday).unwrap();
        assert_eq!(stats.total, 0);
    }
}
