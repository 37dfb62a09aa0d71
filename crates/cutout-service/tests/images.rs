//! Background-removal integration tests, with ClipDrop mocked.

mod common;

use axum_test::multipart::{MultipartForm, Part};
use axum::http::StatusCode;
use common::TestHarness;
use cutout_store::Store;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn clipdrop_harness() -> (TestHarness, MockServer) {
    let mock = MockServer::start().await;
    let uri = mock.uri();
    let harness = TestHarness::with_config(move |config| {
        config.clipdrop_api_url = uri;
        config.clipdrop_api_key = Some("clipdrop-test-key".into());
    });
    (harness, mock)
}

fn image_form() -> MultipartForm {
    let part = Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name("photo.png")
        .mime_type("image/png");
    MultipartForm::new().add_part("image", part)
}

#[tokio::test]
async fn remove_background_bills_one_credit() {
    let (harness, mock) = clipdrop_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/remove-background/v1"))
        .and(header("x-api-key", "clipdrop-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .expect(1)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/image/remove-bg")
        .add_header("authorization", harness.user_auth_header())
        .multipart(image_form())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 4);
    // "PNGDATA" base64-encoded
    assert_eq!(body["image"], "data:image/png;base64,UE5HREFUQQ==");

    let account = harness
        .store
        .get_account(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.credit_balance, 4);
}

#[tokio::test]
async fn zero_balance_never_reaches_the_transform() {
    let (harness, mock) = clipdrop_harness().await;
    harness.seed_account();
    // Drain the signup credits.
    harness
        .store
        .reserve_credits(&harness.test_user_id, 5)
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/remove-background/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .expect(0)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/image/remove-bg")
        .add_header("authorization", harness.user_auth_header())
        .multipart(image_form())
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 0);
}

#[tokio::test]
async fn failed_transform_releases_the_reservation() {
    let (harness, mock) = clipdrop_harness().await;
    harness.seed_account();

    Mock::given(method("POST"))
        .and(path("/remove-background/v1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "upstream exploded"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/api/image/remove-bg")
        .add_header("authorization", harness.user_auth_header())
        .multipart(image_form())
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    let account = harness
        .store
        .get_account(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.credit_balance, 5);
}

#[tokio::test]
async fn missing_image_field_is_rejected_without_billing() {
    let (harness, _mock) = clipdrop_harness().await;
    harness.seed_account();

    let form = MultipartForm::new().add_text("note", "no image here");

    let response = harness
        .server
        .post("/api/image/remove-bg")
        .add_header("authorization", harness.user_auth_header())
        .multipart(form)
        .await;

    response.assert_status_bad_request();

    let account = harness
        .store
        .get_account(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.credit_balance, 5);
}
