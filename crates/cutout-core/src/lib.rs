//! Core types for the cutout platform.
//!
//! This crate provides the foundational types used throughout cutout:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Accounts**: `Account`, `Profile`
//! - **Plans**: `PlanTier` and its fixed credit/price table
//! - **Transactions**: `Transaction`, `Gateway`
//! - **Identity events**: `IdentityEvent` webhook envelope helpers
//!
//! # Credits
//!
//! A credit is the unit consumed by one background-removal call. Credits are
//! purchased in fixed bundles (`PlanTier`) and tracked as an `i64` balance
//! per account.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod identity;
pub mod ids;
pub mod plan;
pub mod transaction;

pub use account::{Account, Profile, DEFAULT_SIGNUP_CREDITS};
pub use identity::IdentityEvent;
pub use ids::{IdError, TransactionId, UserId};
pub use plan::{PlanError, PlanTier};
pub use transaction::{Gateway, Transaction};
