//! Identity webhook integration tests.
//!
//! The webhook handler acks before reconciling, so positive cases poll
//! the store after the response.

mod common;

use std::time::Duration;

use common::TestHarness;
use cutout_store::Store;
use serde_json::json;

fn created_event(user_id: &str, email: &str, first_name: &str) -> String {
    json!({
        "type": "user.created",
        "data": {
            "id": user_id,
            "first_name": first_name,
            "last_name": "Doe",
            "image_url": "https://img.example.com/p.png",
            "primary_email_address_id": "em_1",
            "email_addresses": [
                { "id": "em_1", "email_address": email }
            ]
        }
    })
    .to_string()
}

async fn post_webhook(harness: &TestHarness, body: String) -> axum_test::TestResponse {
    let mut request = harness.server.post("/api/user/webhooks").text(body.clone());
    for (name, value) in TestHarness::webhook_headers(&body) {
        request = request.add_header(name, value);
    }
    request.content_type("application/json").await
}

#[tokio::test]
async fn rejects_bad_signature() {
    let harness = TestHarness::new();
    let body = created_event("user_sig", "sig@example.com", "Sig");

    let response = harness
        .server
        .post("/api/user/webhooks")
        .text(body)
        .add_header("svix-id", "msg_1")
        .add_header("svix-timestamp", "1700000000")
        .add_header("svix-signature", "v1,Zm9yZ2VyeQ==")
        .content_type("application/json")
        .await;

    response.assert_status_bad_request();
    assert!(harness
        .store
        .get_account(&"user_sig".parse().unwrap())
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn created_event_provisions_account_with_signup_credits() {
    let harness = TestHarness::new();
    let body = created_event("user_hook", "hook@example.com", "Hook");

    let response = post_webhook(&harness, body).await;
    response.assert_status_ok();

    let account = harness
        .wait_for(|store| {
            store
                .get_account(&"user_hook".parse().unwrap())
                .unwrap()
        })
        .await;

    assert_eq!(account.credit_balance, 5);
    assert_eq!(account.email, "hook@example.com");
    assert_eq!(account.first_name, "Hook");
}

#[tokio::test]
async fn duplicate_created_event_keeps_first_account() {
    let harness = TestHarness::new();

    post_webhook(
        &harness,
        created_event("user_dup", "dup@example.com", "First"),
    )
    .await
    .assert_status_ok();

    harness
        .wait_for(|store| store.get_account(&"user_dup".parse().unwrap()).unwrap())
        .await;

    post_webhook(
        &harness,
        created_event("user_dup", "dup@example.com", "Second"),
    )
    .await
    .assert_status_ok();

    // Give the second reconciliation time to (not) overwrite.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let account = harness
        .store
        .get_account(&"user_dup".parse().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account.first_name, "First");
    assert_eq!(account.credit_balance, 5);
}

#[tokio::test]
async fn updated_before_created_is_acked_without_account() {
    let harness = TestHarness::new();
    let body = json!({
        "type": "user.updated",
        "data": { "id": "user_phantom", "first_name": "Ghost" }
    })
    .to_string();

    post_webhook(&harness, body).await.assert_status_ok();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(harness
        .store
        .get_account(&"user_phantom".parse().unwrap())
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn deleted_event_removes_account() {
    let harness = TestHarness::new();
    harness.seed_account();

    let body = json!({
        "type": "user.deleted",
        "data": { "id": harness.test_user_id.to_string() }
    })
    .to_string();

    post_webhook(&harness, body).await.assert_status_ok();

    harness
        .wait_for(|store| {
            let gone = store.get_account(&harness.test_user_id).unwrap().is_none();
            gone.then_some(())
        })
        .await;
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let harness = TestHarness::new();
    let body = json!({
        "type": "session.created",
        "data": { "id": "user_whatever" }
    })
    .to_string();

    let response = post_webhook(&harness, body).await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["received"], true);
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let harness = TestHarness::new();
    let body = "not json".to_string();

    let response = post_webhook(&harness, body).await;
    response.assert_status_bad_request();
}
