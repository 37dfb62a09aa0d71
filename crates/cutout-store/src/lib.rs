//! `RocksDB` storage layer for cutout.
//!
//! This crate provides persistent storage for accounts and purchase
//! transactions, with the atomic compound operations the settlement and
//! debit paths depend on.
//!
//! # Architecture
//!
//! Column families:
//!
//! - `accounts`: account records, keyed by `user_id`
//! - `accounts_by_email`: email -> `user_id` index for fallback reconciliation
//! - `transactions`: purchase transactions, keyed by ULID
//! - `transactions_by_user`: index for listing transactions by user
//!
//! # Concurrency
//!
//! `RocksDB` write batches are atomic, but a balance update is a
//! read-modify-write, so every compound operation runs under a per-account
//! lock. Duplicate webhook delivery and concurrent gateway callbacks are
//! absorbed by conditional writes: `create_account_if_absent` never
//! overwrites an existing row, and `settle_transaction` applies credit only
//! on the single false -> true transition of the settled flag.

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

use cutout_core::{Account, Profile, Transaction, TransactionId, UserId};

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Credit was applied and the transaction marked settled.
    Applied {
        /// Account balance after the credit.
        new_balance: i64,
    },
    /// The transaction was already settled; no state changed. This is a
    /// defined idempotent outcome, not an error.
    AlreadySettled,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g. `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert an account only if no account exists for its `user_id` or its
    /// email. Returns `true` if the insert happened, `false` if an account
    /// was already present (duplicate delivery: existing balance and profile
    /// are left untouched).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_account_if_absent(&self, account: &Account) -> Result<bool>;

    /// Get an account by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Look up an account through the email index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Update profile fields on an existing account. Returns `false`
    /// without error when no account matches (an `updated` event arriving
    /// before `created` must not be fatal).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn update_profile(&self, user_id: &UserId, profile: &Profile) -> Result<bool>;

    /// Delete the account matched by user id, falling back to the email
    /// index. Returns `false` when no account matches. Transactions are
    /// retained (orphaned).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_account(&self, user_id: &UserId, fallback_email: Option<&str>) -> Result<bool>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Insert a purchase transaction and its user index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Get a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// Record the gateway-side reference (order id / session id) on a
    /// transaction after the external order-creation call.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the transaction doesn't exist.
    fn set_gateway_ref(&self, transaction_id: &TransactionId, gateway_ref: &str) -> Result<()>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Settle a transaction: flip `settled` to true and add the
    /// transaction's credits to the owning account, in one atomic write.
    ///
    /// Safe to call more than once for the same id; a repeat call returns
    /// `Settlement::AlreadySettled` without touching the balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction or its account doesn't
    ///   exist.
    fn settle_transaction(&self, transaction_id: &TransactionId) -> Result<Settlement>;

    /// Reserve credits ahead of metered work: fail if the balance is below
    /// `amount`, otherwise decrement and return the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance is too low.
    fn reserve_credits(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    /// Return previously reserved credits after the metered work failed.
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn release_credits(&self, user_id: &UserId, amount: i64) -> Result<i64>;
}
