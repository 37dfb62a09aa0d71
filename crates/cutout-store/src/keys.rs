//! Key encoding utilities for `RocksDB`.

use cutout_core::{TransactionId, UserId};

/// Separator between the variable-length user id and the ULID in index
/// keys. Provider ids are printable ASCII, so a NUL byte never collides.
const INDEX_SEPARATOR: u8 = 0x00;

/// Create an account key from a user id.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create an email index key.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a transaction key from a transaction id.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id || 0x00 || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, transactions for a user sort by time.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.as_bytes().len() + 17);
    key.extend_from_slice(user_id.as_bytes());
    key.push(INDEX_SEPARATOR);
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.as_bytes().len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(INDEX_SEPARATOR);
    prefix
}

/// Extract the transaction id from a user-transaction index key.
///
/// Returns `None` when the key is too short to carry a separator plus a
/// 16-byte ULID suffix.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> Option<TransactionId> {
    if key.len() < 17 {
        return None;
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[key.len() - 16..]);
    TransactionId::from_bytes(bytes).ok()
}
