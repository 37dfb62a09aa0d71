//! API handlers.

pub mod accounts;
pub mod health;
pub mod images;
pub mod payments;
pub mod webhooks;
