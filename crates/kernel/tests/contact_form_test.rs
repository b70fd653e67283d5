#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Contact form submission through the page routes.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use tessera_kernel::content::ContactFormBlock;
use tessera_kernel::form::{
    ContactForm, INVALID_FORM_MESSAGE, SharedContactForm, SubmissionError, SubmitOutcome,
};
use tessera_kernel::store::MemoryContentStore;
use tessera_test_utils::{
    ScriptedSubmissionClient, assert, blocks, standard_contact_form, test_page,
};

#[tokio::test]
async fn form_renders_with_block_position() {
    let app = TestApp::new();
    let (status, body) = app.get("/contact").await;

    assert_eq!(status, StatusCode::OK);
    assert::contains(&body, r##"action="/contact#block-1""##);
    assert::contains(&body, r#"<input type="hidden" name="_block" value="1">"#);
    assert::contains(&body, r#"name="email" type="email""#);
    assert::contains(&body, ">Send</button>");
}

#[tokio::test]
async fn valid_submission_sends_once_and_thanks() {
    let app = TestApp::new();
    let (status, body) = app
        .post_form(
            "/contact",
            &[
                ("_block", "1"),
                ("name", "Ana"),
                ("email", "ana@example.com"),
                ("message", "Hello"),
                ("unexpected", "ignored"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert::contains(&body, "Thank you!");
    assert::not_contains(&body, "<form");

    let payloads = app.submissions.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        serde_json::Value::Object(payloads[0].clone()),
        json!({ "name": "Ana", "email": "ana@example.com", "message": "Hello" })
    );
}

#[tokio::test]
async fn untouched_optional_fields_are_sent_empty() {
    let app = TestApp::new();
    app.post_form(
        "/contact",
        &[("_block", "1"), ("name", "Ana"), ("email", "ana@example.com")],
    )
    .await;

    let payloads = app.submissions.payloads();
    assert_eq!(payloads[0]["message"], "");
}

#[tokio::test]
async fn missing_required_field_makes_no_call() {
    let app = TestApp::new();
    let (status, body) = app
        .post_form("/contact", &[("_block", "1"), ("name", "Ana"), ("email", "")])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.submissions.calls(), 0);
    assert::contains(&body, INVALID_FORM_MESSAGE);
    assert::contains(&body, "Email is required");
    // Entered values survive.
    assert::contains(&body, r#"value="Ana""#);
}

#[tokio::test]
async fn rejected_submission_shows_server_message() {
    let submissions = ScriptedSubmissionClient::new()
        .then(Err(SubmissionError::Rejected("Mailbox is full".to_string())));
    let app = TestApp::builder().submissions(submissions).build();

    let (status, body) = app
        .post_form(
            "/contact",
            &[("_block", "1"), ("name", "Ana"), ("email", "ana@example.com")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.submissions.calls(), 1);
    assert::contains(&body, "Mailbox is full");
    assert::not_contains(&body, "Thank you!");
    assert::contains(&body, r#"value="ana@example.com""#);
    // The rest of the page is unaffected.
    assert::contains(&body, "Contact us");
}

#[tokio::test]
async fn bad_block_position_is_rejected() {
    let app = TestApp::new();

    let (status, _) = app.post_form("/contact", &[("name", "Ana")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_form("/contact", &[("_block", "x")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Position 0 is an intro block.
    let (status, _) = app.post_form("/contact", &[("_block", "0")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_form("/contact", &[("_block", "7")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.submissions.calls(), 0);
}

#[tokio::test]
async fn post_to_unknown_page_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.post_form("/nowhere", &[("_block", "0")]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_and_service_pages_accept_forms() {
    let store = MemoryContentStore::new()
        .with_document(
            "pages",
            test_page("Home", "home")
                .with_block(standard_contact_form())
                .build(),
        )
        .with_document(
            "service-pages",
            test_page("Tax", "tax")
                .with_block(blocks::hero("Tax"))
                .with_block(standard_contact_form())
                .build(),
        );
    let app = TestApp::builder().store(Arc::new(store)).build();

    let (_, home) = app.get("/").await;
    assert::contains(&home, r##"action="/#block-0""##);
    let (status, body) = app
        .post_form("/", &[("_block", "0"), ("name", "A"), ("email", "a@b.co")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert::contains(&body, "Thank you!");

    let (status, body) = app
        .post_form(
            "/services/tax",
            &[("_block", "1"), ("name", "B"), ("email", "b@c.co")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert::contains(&body, "Thank you!");
    assert_eq!(app.submissions.calls(), 2);
}

#[tokio::test]
async fn rapid_double_submit_sends_once() {
    let block: ContactFormBlock = serde_json::from_value(standard_contact_form()).unwrap();

    let body: HashMap<String, String> = [("name", "Ana"), ("email", "ana@example.com")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let shared = SharedContactForm::new(ContactForm::from_block(&block));
    shared.update(|form| form.apply_form_body(&body));

    let client = ScriptedSubmissionClient::new().with_delay(Duration::from_millis(50));
    let (first, second) = tokio::join!(shared.submit(&client), shared.submit(&client));

    assert_eq!(client.calls(), 1);
    let outcomes = [first, second];
    assert!(outcomes.contains(&SubmitOutcome::Submitted));
    assert!(outcomes.contains(&SubmitOutcome::Ignored));
}
