//! Credit purchase and settlement handlers.
//!
//! A purchase intent writes an unsettled `Transaction` before the
//! gateway is called, so every gateway-side order is correlated to a
//! durable row. Settlement is idempotent: repeated verification of the
//! same purchase credits the account exactly once.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use cutout_core::{Gateway, PlanTier, Transaction, TransactionId};
use cutout_store::{Settlement, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::razorpay::RazorpayClient;
use crate::state::AppState;
use crate::stripe::StripeClient;

/// Purchase request body.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Plan tier name ("Basic", "Advanced" or "Business").
    pub plan: String,
}

/// Razorpay purchase response.
#[derive(Debug, Serialize)]
pub struct RazorpayOrderResponse {
    /// Our transaction id.
    pub transaction_id: String,
    /// Razorpay order id, fed to the client-side checkout.
    pub order_id: String,
    /// Amount in the currency's smallest unit.
    pub amount: i64,
    /// Currency code.
    pub currency: String,
}

/// Start a Razorpay credit purchase.
pub async fn pay_razorpay(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<RazorpayOrderResponse>, ApiError> {
    let plan: PlanTier = request
        .plan
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown plan: {}", request.plan)))?;

    let razorpay = require_razorpay(&state)?;

    if state.store.get_account(&auth.user_id)?.is_none() {
        return Err(ApiError::BadRequest("invalid account".into()));
    }

    // The durable intent row precedes the gateway call.
    let transaction = Transaction::new(auth.user_id, plan, Gateway::Razorpay);
    state.store.put_transaction(&transaction)?;

    // Razorpay amounts are in the smallest unit (paise).
    let amount = transaction.price_amount * 100;
    let order = razorpay
        .create_order(amount, &state.config.currency, &transaction.id.to_string())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, transaction_id = %transaction.id, "Order creation failed");
            ApiError::ExternalService("Payment gateway unavailable".into())
        })?;

    state.store.set_gateway_ref(&transaction.id, &order.id)?;

    tracing::info!(
        transaction_id = %transaction.id,
        order_id = %order.id,
        plan = %plan,
        "Razorpay order created"
    );

    Ok(Json(RazorpayOrderResponse {
        transaction_id: transaction.id.to_string(),
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
    }))
}

/// Razorpay verification request body.
#[derive(Debug, Deserialize)]
pub struct VerifyRazorpayRequest {
    /// The Razorpay order id reported paid by the client.
    pub order_id: String,
}

/// Settlement response, shared by both gateways.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Whether the purchase is settled (also true on repeat verification).
    pub settled: bool,
    /// True when this call found the purchase already settled and applied
    /// no new credit.
    pub already_settled: bool,
    /// Credit balance after settlement.
    pub credits: i64,
}

/// Verify a Razorpay payment and settle the purchase.
///
/// Proof is the refetched order: the client's claim is never trusted.
pub async fn verify_razorpay(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRazorpayRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let razorpay = require_razorpay(&state)?;

    let order = razorpay.fetch_order(&request.order_id).await.map_err(|e| {
        tracing::error!(error = %e, order_id = %request.order_id, "Order fetch failed");
        ApiError::ExternalService("Payment gateway unavailable".into())
    })?;

    if !order.is_paid() {
        tracing::info!(order_id = %order.id, status = %order.status, "Order not paid");
        return Err(ApiError::PaymentNotCompleted);
    }

    // The receipt carries our transaction id.
    let transaction_id: TransactionId = order
        .receipt
        .as_deref()
        .and_then(|r| r.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Order carries no valid receipt".into()))?;

    settle(&state, &transaction_id)
}

/// Stripe purchase response.
#[derive(Debug, Serialize)]
pub struct StripeSessionResponse {
    /// Our transaction id.
    pub transaction_id: String,
    /// Hosted checkout page URL.
    pub url: String,
}

/// Start a Stripe credit purchase.
pub async fn pay_stripe(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<StripeSessionResponse>, ApiError> {
    let plan: PlanTier = request
        .plan
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown plan: {}", request.plan)))?;

    let stripe = require_stripe(&state)?;

    if state.store.get_account(&auth.user_id)?.is_none() {
        return Err(ApiError::BadRequest("invalid account".into()));
    }

    let transaction = Transaction::new(auth.user_id, plan, Gateway::Stripe);
    state.store.put_transaction(&transaction)?;

    let tx_id = transaction.id.to_string();
    let frontend = &state.config.frontend_url;
    let success_url = format!("{frontend}/verify?success=true&transactionId={tx_id}");
    let cancel_url = format!("{frontend}/verify?success=false&transactionId={tx_id}");

    let session = stripe
        .create_checkout_session(
            plan.as_str(),
            transaction.price_amount * 100,
            &state.config.currency,
            &tx_id,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, transaction_id = %tx_id, "Checkout session creation failed");
            ApiError::ExternalService("Payment gateway unavailable".into())
        })?;

    state.store.set_gateway_ref(&transaction.id, &session.id)?;

    let url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Checkout session has no URL".into()))?;

    tracing::info!(
        transaction_id = %tx_id,
        session_id = %session.id,
        plan = %plan,
        "Stripe checkout session created"
    );

    Ok(Json(StripeSessionResponse {
        transaction_id: tx_id,
        url,
    }))
}

/// Stripe verification request body.
#[derive(Debug, Deserialize)]
pub struct VerifyStripeRequest {
    /// Our transaction id, carried through the redirect URL.
    pub transaction_id: String,
    /// The redirect's success flag. Advisory only; settlement requires the
    /// refetched session to read `paid`.
    pub success: bool,
}

/// Verify a Stripe payment and settle the purchase.
pub async fn verify_stripe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyStripeRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    if !request.success {
        return Err(ApiError::PaymentNotCompleted);
    }

    let transaction_id: TransactionId = request
        .transaction_id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid transaction id".into()))?;

    let transaction = state
        .store
        .get_transaction(&transaction_id)?
        .ok_or_else(|| ApiError::NotFound("Transaction not found".into()))?;

    let session_id = transaction
        .gateway_ref
        .ok_or_else(|| ApiError::BadRequest("Transaction has no checkout session".into()))?;

    let stripe = require_stripe(&state)?;

    // Re-validate on Stripe's side; the redirect flag alone proves nothing.
    let session = stripe.get_checkout_session(&session_id).await.map_err(|e| {
        tracing::error!(error = %e, session_id = %session_id, "Session fetch failed");
        ApiError::ExternalService("Payment gateway unavailable".into())
    })?;

    if !session.is_paid() {
        tracing::info!(
            session_id = %session_id,
            payment_status = %session.payment_status,
            "Checkout session not paid"
        );
        return Err(ApiError::PaymentNotCompleted);
    }

    settle(&state, &transaction_id)
}

/// Settle a verified purchase and shape the response. Already-settled is
/// a success, not an error; the credit was applied by an earlier call.
fn settle(
    state: &AppState,
    transaction_id: &TransactionId,
) -> Result<Json<SettlementResponse>, ApiError> {
    match state.store.settle_transaction(transaction_id)? {
        Settlement::Applied { new_balance } => {
            tracing::info!(
                transaction_id = %transaction_id,
                credits = new_balance,
                "Purchase settled"
            );
            Ok(Json(SettlementResponse {
                settled: true,
                already_settled: false,
                credits: new_balance,
            }))
        }
        Settlement::AlreadySettled => {
            let transaction = state
                .store
                .get_transaction(transaction_id)?
                .ok_or_else(|| ApiError::NotFound("Transaction not found".into()))?;
            let account = state
                .store
                .get_account(&transaction.user_id)?
                .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

            Ok(Json(SettlementResponse {
                settled: true,
                already_settled: true,
                credits: account.credit_balance,
            }))
        }
    }
}

fn require_razorpay(state: &AppState) -> Result<&Arc<RazorpayClient>, ApiError> {
    state
        .razorpay
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Razorpay not configured".into()))
}

fn require_stripe(state: &AppState) -> Result<&Arc<StripeClient>, ApiError> {
    state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))
}
