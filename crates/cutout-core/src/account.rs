//! Account types for cutout.
//!
//! One account exists per external identity, mirroring the identity
//! provider's record plus a credit balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to every newly created account.
pub const DEFAULT_SIGNUP_CREDITS: i64 = 5;

/// A user account with a credit balance.
///
/// Accounts are created when the identity provider delivers a `user.created`
/// event, updated on `user.updated`, and removed on `user.deleted`. The
/// email acts as a fallback reconciliation key for legacy rows that predate
/// the provider's stable id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The identity provider's stable id (unique, sparse on legacy rows).
    pub user_id: UserId,

    /// Contact email (required, unique). Empty when the provider payload
    /// carried no resolvable address; reconciliation then keys on `user_id`
    /// only.
    pub email: String,

    /// Display first name.
    pub first_name: String,

    /// Display last name.
    pub last_name: String,

    /// Avatar URL.
    pub photo: String,

    /// Current credit balance. Non-negative.
    pub credit_balance: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the signup credit grant.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            photo: String::new(),
            credit_balance: DEFAULT_SIGNUP_CREDITS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach profile fields to the account.
    #[must_use]
    pub fn with_profile(mut self, profile: &Profile) -> Self {
        if !profile.email.is_empty() {
            self.email = profile.email.clone();
        }
        self.first_name = profile.first_name.clone();
        self.last_name = profile.last_name.clone();
        self.photo = profile.photo.clone();
        self
    }
}

/// Display-only profile fields carried by identity events.
///
/// Profile fields are mutated freely; no invariants attach to them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Contact email.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Avatar URL.
    pub photo: String,
}
