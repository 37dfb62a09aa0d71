//! `RocksDB` storage implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use cutout_core::{Account, Profile, Transaction, TransactionId, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Settlement, Store};

/// RocksDB-backed storage implementation.
///
/// Balance mutations are read-modify-write sequences, so each compound
/// operation serializes on a per-account lock before committing its
/// `WriteBatch`. The lock registry grows with the set of accounts touched
/// since startup; entries are small (`Arc<Mutex<()>>`).
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    account_locks: Mutex<HashMap<Vec<u8>, Arc<Mutex<()>>>>,
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
            account_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Get (or create) the mutation lock for an account.
    fn account_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self
            .account_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(user_id.as_bytes().to_vec())
            .or_default()
            .clone()
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

    /// Write an account record, maintaining no indexes.
    fn put_account_raw(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;
        batch.put_cf(&cf, key, value);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

/// Acquire a lock, recovering from poisoning (a panic in another holder
/// does not invalidate the stored data).
fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account_if_absent(&self, account: &Account) -> Result<bool> {
        let guard = self.account_lock(&account.user_id);
        let _guard = lock(&guard);

        if self.get_account(&account.user_id)?.is_some() {
            return Ok(false);
        }
        if !account.email.is_empty() && self.find_account_by_email(&account.email)?.is_some() {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        self.put_account_raw(&mut batch, account)?;
        if !account.email.is_empty() {
            let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;
            batch.put_cf(
                &cf_email,
                keys::email_key(&account.email),
                account.user_id.as_bytes(),
            );
        }
        self.write(batch)?;

        Ok(true)
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_email, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let user_id: UserId = String::from_utf8(id_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?
            .parse()
            .map_err(|_| StoreError::Serialization("empty user id in email index".into()))?;

        self.get_account(&user_id)
    }

    fn update_profile(&self, user_id: &UserId, profile: &Profile) -> Result<bool> {
        let guard = self.account_lock(user_id);
        let _guard = lock(&guard);

        let Some(mut account) = self.get_account(user_id)? else {
            return Ok(false);
        };

        let old_email = account.email.clone();
        account = account.with_profile(profile);
        account.updated_at = chrono::Utc::now();

        let mut batch = WriteBatch::default();
        self.put_account_raw(&mut batch, &account)?;

        if account.email != old_email {
            let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;
            if !old_email.is_empty() {
                batch.delete_cf(&cf_email, keys::email_key(&old_email));
            }
            if !account.email.is_empty() {
                batch.put_cf(
                    &cf_email,
                    keys::email_key(&account.email),
                    account.user_id.as_bytes(),
                );
            }
        }
        self.write(batch)?;

        Ok(true)
    }

    fn delete_account(&self, user_id: &UserId, fallback_email: Option<&str>) -> Result<bool> {
        // Resolve the owning row first so the lock is taken on the actual
        // owner, which may differ from `user_id` on an email-fallback match.
        let target = match self.get_account(user_id)? {
            Some(account) => Some(account),
            None => match fallback_email {
                Some(email) if !email.is_empty() => self.find_account_by_email(email)?,
                _ => None,
            },
        };
        let Some(target) = target else {
            return Ok(false);
        };

        let guard = self.account_lock(&target.user_id);
        let _guard = lock(&guard);

        let Some(account) = self.get_account(&target.user_id)? else {
            return Ok(false);
        };

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_accounts, keys::account_key(&account.user_id));
        if !account.email.is_empty() {
            let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;
            batch.delete_cf(&cf_email, keys::email_key(&account.email));
        }
        self.write(batch)?;

        Ok(true)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let value = Self::serialize(transaction)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []); // Index entry (empty value)

        self.write(batch)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn set_gateway_ref(&self, transaction_id: &TransactionId, gateway_ref: &str) -> Result<()> {
        let tx = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;

        // Serialize against settlement of the same transaction.
        let guard = self.account_lock(&tx.user_id);
        let _guard = lock(&guard);

        let mut tx = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;
        tx.gateway_ref = Some(gateway_ref.to_string());

        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(transaction_id),
            Self::serialize(&tx)?,
        );
        self.write(batch)
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect matching keys; ULIDs are time-ordered, so reversing gives
        // newest first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }
            let tx_id = keys::extract_transaction_id_from_user_key(&key).ok_or_else(|| {
                StoreError::Serialization(format!(
                    "malformed user-transaction index key ({} bytes)",
                    key.len()
                ))
            })?;
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn settle_transaction(&self, transaction_id: &TransactionId) -> Result<Settlement> {
        let tx = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;

        let guard = self.account_lock(&tx.user_id);
        let _guard = lock(&guard);

        // Re-read under the lock: a concurrent confirmation of the same
        // transaction may have settled it between the lookup and here.
        let mut tx = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;
        if tx.settled {
            return Ok(Settlement::AlreadySettled);
        }

        let mut account = self.get_account(&tx.user_id)?.ok_or(StoreError::NotFound)?;
        account.credit_balance += tx.credit_amount;
        account.updated_at = chrono::Utc::now();
        tx.settled = true;

        // Balance increment and settled flag commit together or not at all.
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        self.put_account_raw(&mut batch, &account)?;
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(transaction_id),
            Self::serialize(&tx)?,
        );
        self.write(batch)?;

        tracing::debug!(
            transaction_id = %transaction_id,
            user_id = %account.user_id,
            credits = tx.credit_amount,
            new_balance = account.credit_balance,
            "transaction settled"
        );

        Ok(Settlement::Applied {
            new_balance: account.credit_balance,
        })
    }

    fn reserve_credits(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        let guard = self.account_lock(user_id);
        let _guard = lock(&guard);

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        if account.credit_balance < amount {
            return Err(StoreError::InsufficientCredits {
                balance: account.credit_balance,
                required: amount,
            });
        }

        account.credit_balance -= amount;
        account.updated_at = chrono::Utc::now();

        let mut batch = WriteBatch::default();
        self.put_account_raw(&mut batch, &account)?;
        self.write(batch)?;

        Ok(account.credit_balance)
    }

    fn release_credits(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        let guard = self.account_lock(user_id);
        let _guard = lock(&guard);

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        account.credit_balance += amount;
        account.updated_at = chrono::Utc::now();

        let mut batch = WriteBatch::default();
        self.put_account_raw(&mut batch, &account)?;
        self.write(batch)?;

        Ok(account.credit_balance)
    }
}
