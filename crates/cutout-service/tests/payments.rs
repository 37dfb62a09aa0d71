//! Purchase and settlement integration tests, with the gateways mocked.

mod common;

use common::TestHarness;
use cutout_store::Store;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn razorpay_harness() -> (TestHarness, MockServer) {
    let mock = MockServer::start().await;
    let uri = mock.uri();
    let harness = TestHarness::with_config(move |config| {
        config.razorpay_api_url = uri;
        config.razorpay_key_id = Some("rzp_test_key".into());
        config.razorpay_key_secret = Some("rzp_test_secret".into());
    });
    (harness, mock)
}

async fn stripe_harness() -> (TestHarness, MockServer) {
    let mock = MockServer::start().await;
    let uri = mock.uri();
    let harness = TestHarness::with_config(move |config| {
        config.stripe_api_url = uri;
        config.stripe_api_key = Some("sk_test_key".into());
    });
    (harness, mock)
}

#[tokio::test]
async fn unknown_plan_is_rejected_without_transaction() {
    let (harness, _mock) = razorpay_harness().await;
    harness.seed_account();

    let response = harness
        .server
        .post("/api/user/pay-razor")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Gold" }))
        .await;

    response.assert_status_bad_request();

    let transactions = harness
        .store
        .list_transactions_by_user(&harness.test_user_id, 10, 0)
        .unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn pay_razorpay_without_account_is_rejected() {
    let (harness, mock) = razorpay_harness().await;
    // No account seeded: the webhook has not provisioned this user.

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_NEVER",
            "amount": 5000,
            "currency": "INR",
            "status": "created"
        })))
        .expect(0)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/user/pay-razor")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Basic" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["message"], "invalid account");

    let transactions = harness
        .store
        .list_transactions_by_user(&harness.test_user_id, 10, 0)
        .unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn pay_stripe_without_account_is_rejected() {
    let (harness, mock) = stripe_harness().await;

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_never",
            "url": "https://checkout.stripe.com/pay/cs_never",
            "payment_status": "unpaid",
            "metadata": {}
        })))
        .expect(0)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/user/pay-stripe")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Basic" }))
        .await;

    response.assert_status_bad_request();

    let transactions = harness
        .store
        .list_transactions_by_user(&harness.test_user_id, 10, 0)
        .unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn pay_razorpay_creates_unsettled_transaction() {
    let (harness, mock) = razorpay_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_MOCK1",
            "amount": 20000,
            "currency": "INR",
            "receipt": null,
            "status": "created"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/user/pay-razor")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Advanced" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["order_id"], "order_MOCK1");
    assert_eq!(body["amount"], 20000);

    let transactions = harness
        .store
        .list_transactions_by_user(&harness.test_user_id, 10, 0)
        .unwrap();
    assert_eq!(transactions.len(), 1);
    let tx = &transactions[0];
    assert_eq!(tx.id.to_string(), body["transaction_id"]);
    assert_eq!(tx.credit_amount, 500);
    assert_eq!(tx.price_amount, 200);
    assert!(!tx.settled);
    assert_eq!(tx.gateway_ref.as_deref(), Some("order_MOCK1"));
}

#[tokio::test]
async fn razorpay_purchase_settles_exactly_once() {
    let (harness, mock) = razorpay_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_E2E",
            "amount": 5000,
            "currency": "INR",
            "status": "created"
        })))
        .mount(&mock)
        .await;

    let pay: serde_json::Value = harness
        .server
        .post("/api/user/pay-razor")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Basic" }))
        .await
        .json();
    let transaction_id = pay["transaction_id"].as_str().unwrap().to_string();

    // The refetched order is the settlement proof.
    Mock::given(method("GET"))
        .and(path("/orders/order_E2E"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_E2E",
            "amount": 5000,
            "currency": "INR",
            "receipt": transaction_id,
            "status": "paid"
        })))
        .mount(&mock)
        .await;

    let verify = harness
        .server
        .post("/api/user/verify-razor")
        .json(&json!({ "order_id": "order_E2E" }))
        .await;
    verify.assert_status_ok();
    let body: serde_json::Value = verify.json();
    assert_eq!(body["settled"], true);
    assert_eq!(body["already_settled"], false);
    assert_eq!(body["credits"], 105); // 5 signup + 100 Basic

    // Repeat verification must not double-credit.
    let again: serde_json::Value = harness
        .server
        .post("/api/user/verify-razor")
        .json(&json!({ "order_id": "order_E2E" }))
        .await
        .json();
    assert_eq!(again["settled"], true);
    assert_eq!(again["already_settled"], true);
    assert_eq!(again["credits"], 105);

    let account = harness
        .store
        .get_account(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.credit_balance, 105);
}

#[tokio::test]
async fn unpaid_order_applies_no_credit() {
    let (harness, mock) = razorpay_harness().await;
    harness.seed_account();

    Mock::given(method("GET"))
        .and(path("/orders/order_UNPAID"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_UNPAID",
            "amount": 5000,
            "currency": "INR",
            "status": "attempted"
        })))
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/user/verify-razor")
        .json(&json!({ "order_id": "order_UNPAID" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "payment_not_completed");

    let account = harness
        .store
        .get_account(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.credit_balance, 5);
}

#[tokio::test]
async fn pay_stripe_returns_checkout_url() {
    let (harness, mock) = stripe_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/pay/cs_test_1",
            "payment_status": "unpaid",
            "metadata": {}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/user/pay-stripe")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Business" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["url"], "https://checkout.stripe.com/pay/cs_test_1");

    let transactions = harness
        .store
        .list_transactions_by_user(&harness.test_user_id, 10, 0)
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].credit_amount, 5000);
    assert_eq!(transactions[0].gateway_ref.as_deref(), Some("cs_test_1"));
}

#[tokio::test]
async fn verify_stripe_revalidates_against_the_session() {
    let (harness, mock) = stripe_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_2",
            "url": "https://checkout.stripe.com/pay/cs_test_2",
            "payment_status": "unpaid",
            "metadata": {}
        })))
        .mount(&mock)
        .await;

    let pay: serde_json::Value = harness
        .server
        .post("/api/user/pay-stripe")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "plan": "Basic" }))
        .await
        .json();
    let transaction_id = pay["transaction_id"].as_str().unwrap().to_string();

    // Session still unpaid: the client's success flag must not settle.
    let unpaid_guard = Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_test_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_2",
            "payment_status": "unpaid",
            "metadata": { "transaction_id": transaction_id }
        })))
        .expect(1)
        .mount_as_scoped(&mock)
        .await;

    let premature = harness
        .server
        .post("/api/user/verify-stripe")
        .json(&json!({ "transaction_id": transaction_id, "success": true }))
        .await;
    premature.assert_status_bad_request();
    drop(unpaid_guard);

    // Now the session reads paid.
    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_test_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_2",
            "payment_status": "paid",
            "metadata": { "transaction_id": transaction_id }
        })))
        .mount(&mock)
        .await;

    let verify = harness
        .server
        .post("/api/user/verify-stripe")
        .json(&json!({ "transaction_id": transaction_id, "success": true }))
        .await;
    verify.assert_status_ok();
    let body: serde_json::Value = verify.json();
    assert_eq!(body["credits"], 105);
}

#[tokio::test]
async fn verify_stripe_with_cancel_flag_is_not_settled() {
    let (harness, _mock) = stripe_harness().await;
    harness.seed_account();

    let response = harness
        .server
        .post("/api/user/verify-stripe")
        .json(&json!({ "transaction_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "success": false }))
        .await;

    response.assert_status_bad_request();
}
