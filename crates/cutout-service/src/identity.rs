//! Identity event reconciliation.
//!
//! Webhook delivery is acknowledged before this code runs; everything
//! here is best-effort. Failures are logged and dropped, never surfaced
//! to the provider (a non-2xx after ack would only trigger redundant
//! redelivery of an event we already have).

use std::time::Duration;

use cutout_core::{Account, IdentityEvent, UserId};
use cutout_store::Store;

use crate::state::AppState;

/// Attempts per store operation before giving up on an event.
const STORE_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retries; grows linearly per attempt.
const STORE_RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Attempts for the profile-fetch email fallback.
const PROFILE_FETCH_ATTEMPTS: u32 = 2;

/// Process a verified identity event against the store.
///
/// Duplicate and out-of-order deliveries are absorbed: `created` is
/// insert-only-if-absent, `updated` and `deleted` are no-ops when the
/// account is missing.
pub async fn process_event(state: &AppState, event: IdentityEvent) {
    let Some(user_id) = event.user_id().map(ToString::to_string) else {
        tracing::warn!(event_type = %event.event_type, "Identity event without user id, ignoring");
        return;
    };
    let Ok(user_id) = user_id.parse::<UserId>() else {
        tracing::warn!(event_type = %event.event_type, "Identity event with empty user id, ignoring");
        return;
    };

    match event.event_type.as_str() {
        "user.created" => handle_created(state, &user_id, &event).await,
        "user.updated" => handle_updated(state, &user_id, &event).await,
        "user.deleted" => handle_deleted(state, &user_id, &event).await,
        other => {
            tracing::debug!(event_type = %other, "Unhandled identity event type");
        }
    }
}

async fn handle_created(state: &AppState, user_id: &UserId, event: &IdentityEvent) {
    let email = resolve_email(state, user_id, event).await;

    let account = Account::new(user_id.clone(), email).with_profile(&event.profile());

    let created = with_retries("create_account", || {
        state.store.create_account_if_absent(&account)
    })
    .await;

    match created {
        Some(true) => {
            tracing::info!(
                user_id = %user_id,
                credits = account.credit_balance,
                "Account created with signup credits"
            );
        }
        Some(false) => {
            tracing::debug!(user_id = %user_id, "Account already exists, created event ignored");
        }
        None => {}
    }
}

async fn handle_updated(state: &AppState, user_id: &UserId, event: &IdentityEvent) {
    let profile = event.profile();

    let updated =
        with_retries("update_profile", || state.store.update_profile(user_id, &profile)).await;

    match updated {
        Some(true) => tracing::info!(user_id = %user_id, "Account profile updated"),
        Some(false) => {
            // An `updated` arriving before `created` is expected under
            // out-of-order delivery.
            tracing::debug!(user_id = %user_id, "Updated event for unknown account, ignoring");
        }
        None => {}
    }
}

async fn handle_deleted(state: &AppState, user_id: &UserId, event: &IdentityEvent) {
    let email = event.email();

    let deleted = with_retries("delete_account", || {
        state.store.delete_account(user_id, email.as_deref())
    })
    .await;

    match deleted {
        Some(true) => tracing::info!(user_id = %user_id, "Account deleted"),
        Some(false) => {
            tracing::debug!(user_id = %user_id, "Deleted event for unknown account, ignoring");
        }
        None => {}
    }
}

/// Resolve the contact email for a `created` event.
///
/// Payload first; when it carries no usable address, fall back to a
/// bounded Clerk profile fetch. Resolution failure is non-fatal: the
/// account is created with an empty email and reconciled by a later
/// `updated` event.
async fn resolve_email(state: &AppState, user_id: &UserId, event: &IdentityEvent) -> String {
    if let Some(email) = event.email() {
        return email;
    }

    let Some(clerk) = &state.clerk else {
        tracing::warn!(user_id = %user_id, "No email in payload and Clerk API not configured");
        return String::new();
    };

    for attempt in 1..=PROFILE_FETCH_ATTEMPTS {
        match clerk.get_user(user_id.as_str()).await {
            Ok(user) => {
                if let Some(email) = user.contact_email() {
                    return email.to_string();
                }
                tracing::warn!(user_id = %user_id, "Clerk profile has no email address");
                return String::new();
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    attempt,
                    error = %e,
                    "Clerk profile fetch failed"
                );
            }
        }
        if attempt < PROFILE_FETCH_ATTEMPTS {
            tokio::time::sleep(STORE_RETRY_BASE_DELAY).await;
        }
    }

    String::new()
}

/// Run a store operation with bounded retries and linear backoff.
/// Returns `None` when all attempts fail; the caller logs nothing more,
/// the gap is accepted.
async fn with_retries<T, F>(operation: &str, mut f: F) -> Option<T>
where
    F: FnMut() -> cutout_store::Result<T>,
{
    for attempt in 1..=STORE_RETRY_ATTEMPTS {
        match f() {
            Ok(value) => return Some(value),
            Err(e) => {
                tracing::warn!(
                    operation,
                    attempt,
                    error = %e,
                    "Store operation failed during event reconciliation"
                );
            }
        }
        if attempt < STORE_RETRY_ATTEMPTS {
            tokio::time::sleep(STORE_RETRY_BASE_DELAY * attempt).await;
        }
    }

    tracing::error!(operation, "Giving up on identity event after retries");
    None
}
