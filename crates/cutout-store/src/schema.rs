//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Index: email -> `user_id`. Enables the email-fallback reconciliation
    /// path for rows that predate the provider's stable id.
    pub const ACCOUNTS_BY_EMAIL: &str = "accounts_by_email";

    /// Purchase transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || 0x00 || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::ACCOUNTS_BY_EMAIL,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
    ]
}
