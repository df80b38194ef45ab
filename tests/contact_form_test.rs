mod common;

use axum::http::{header, StatusCode};
use common::TestApp;
use sea_orm::EntityTrait;
use stateset_storefront::entities::{ContactMessage, ContactSubject};

const VALID_FORM: &str = "first_name=Grace&last_name=Hopper&email=grace%40example.com\
&phone=555-0100&subject=order_status&message=Where+is+my+order%3F&newsletter_signup=on";

#[tokio::test]
async fn blank_form_lists_subjects() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/contact/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subjects"].as_array().unwrap().len(), 9);
    assert!(body.get("success_message").is_none());
}

#[tokio::test]
async fn valid_submission_persists_one_unresolved_row_and_redirects() {
    let app = TestApp::new().await;

    let (status, headers, body) = app.post_form("/contact/", VALID_FORM).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/contact/?submitted=1")
    );
    assert!(body["message"].as_str().unwrap().starts_with("Thank you, Grace!"));

    assert_eq!(app.contact_message_count().await, 1);
    let stored = ContactMessage::find().one(app.db()).await.unwrap().unwrap();
    assert!(!stored.is_resolved);
    assert!(stored.newsletter_signup);
    assert_eq!(stored.subject, ContactSubject::OrderStatus);
    assert_eq!(stored.phone.as_deref(), Some("555-0100"));
    assert!(stored.admin_notes.is_none());

    let (status, body) = app.get("/contact/?submitted=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["success_message"].is_string());
}

#[tokio::test]
async fn missing_email_is_rejected_without_persisting() {
    let app = TestApp::new().await;
    let form = VALID_FORM.replace("email=grace%40example.com", "email=");

    let (status, _, body) = app.post_form("/contact/", &form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "This field is required.");
    assert_eq!(body["form"]["first_name"], "Grace");
    assert!(body["error_message"].is_string());
    assert_eq!(app.contact_message_count().await, 0);
}

#[tokio::test]
async fn unknown_subject_is_a_field_error() {
    let app = TestApp::new().await;
    let form = VALID_FORM.replace("subject=order_status", "subject=refund");

    let (status, _, body) = app.post_form("/contact/", &form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["subject"].is_array());
    assert!(body["errors"].get("email").is_none());
    assert_eq!(app.contact_message_count().await, 0);
}

#[tokio::test]
async fn unticked_newsletter_defaults_to_false() {
    let app = TestApp::new().await;
    let form = VALID_FORM.replace("&newsletter_signup=on", "");

    let (status, _, _) = app.post_form("/contact/", &form).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let stored = ContactMessage::find().one(app.db()).await.unwrap().unwrap();
    assert!(!stored.newsletter_signup);
}

#[tokio::test]
async fn admin_resolves_and_annotates_messages() {
    let app = TestApp::new().await;
    app.post_form("/contact/", VALID_FORM).await;
    let contact = &app.state.services.contact;

    let open = contact.list_messages(true).await.unwrap();
    assert_eq!(open.len(), 1);
    let id = open[0].id;

    let noted = contact
        .set_admin_notes(id, Some("  called back  ".into()))
        .await
        .unwrap();
    assert_eq!(noted.admin_notes.as_deref(), Some("called back"));

    let resolved = contact.set_resolved(id, true).await.unwrap();
    assert!(resolved.is_resolved);
    assert_eq!(contact.count_messages().await.unwrap(), 1);
    assert!(contact.list_messages(true).await.unwrap().is_empty());
    assert_eq!(contact.list_messages(false).await.unwrap().len(), 1);

    let err = contact.set_resolved(9999, true).await.unwrap_err();
    assert!(err.is_not_found());
}
