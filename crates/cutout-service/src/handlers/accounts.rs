//! Account and credit balance handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use cutout_core::Transaction;
use serde::{Deserialize, Serialize};

use cutout_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Credit balance response.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Current credit balance.
    pub credits: i64,
    /// Display name (first name, or email when no name is set).
    pub name: String,
}

/// Get the current user's credit balance.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CreditsResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let name = if account.first_name.is_empty() {
        account.email.clone()
    } else {
        account.first_name.clone()
    };

    Ok(Json(CreditsResponse {
        credits: account.credit_balance,
        name,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Plan tier purchased.
    pub plan: String,
    /// Credits in the bundle.
    pub credits: i64,
    /// Price paid, in whole currency units.
    pub amount: i64,
    /// Gateway that processed the purchase.
    pub gateway: String,
    /// Whether the purchase has settled.
    pub settled: bool,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            plan: tx.plan.as_str().to_string(),
            credits: tx.credit_amount,
            amount: tx.price_amount,
            gateway: tx.gateway.as_str().to_string(),
            settled: tx.settled,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List the current user's purchase history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}
