mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{api_path, fixtures, setup_test_app};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_upload_and_fetch_document() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let document_id =
        fixtures::upload_document(app.client(), &tenant.api_key, "Vendor MSA").await;

    let response = app
        .client()
        .get(&api_path(&format!("/documents/{}", document_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["title"], json!("Vendor MSA"));
    assert_eq!(body["data"]["filename"], json!("MSA.pdf"));
    assert_eq!(body["data"]["content_type"], json!("application/pdf"));
    // Comma-delimited tags were split server-side
    assert_eq!(body["data"]["tags"], json!(["vendor", "msa"]));
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    // Test config caps documents at 1 MiB
    let response = app
        .client()
        .post(&api_path("/documents"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .multipart(fixtures::upload_form(
            "huge.pdf",
            "Too big",
            fixtures::sample_pdf(1024 * 1024 + 1),
        ))
        .await;
    response.assert_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let form = MultipartForm::new()
        .add_text("title", "Nope")
        .add_part(
            "file",
            Part::bytes(b"MZ".to_vec())
                .file_name("malware.exe")
                .mime_type("application/pdf"),
        );
    let response = app
        .client()
        .post(&api_path("/documents"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .multipart(form)
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_upload_requires_title_with_field_error() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(fixtures::sample_pdf(1024))
            .file_name("untitled.pdf")
            .mime_type("application/pdf"),
    );
    let response = app
        .client()
        .post(&api_path("/documents"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .multipart(form)
        .await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    assert_eq!(body["field_errors"][0]["field"], json!("title"));
}

#[tokio::test]
async fn test_get_unknown_document_is_404() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .get(&api_path(&format!("/documents/{}", Uuid::new_v4())))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_metadata_patch_updates_only_given_fields() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;
    let document_id =
        fixtures::upload_document(app.client(), &tenant.api_key, "Original title").await;

    let response = app
        .client()
        .patch(&api_path(&format!("/documents/{}", document_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"description": "Reviewed by legal"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["description"], json!("Reviewed by legal"));
    // Untouched metadata survives
    assert_eq!(body["data"]["title"], json!("Original title"));
}

#[tokio::test]
async fn test_documents_are_tenant_isolated() {
    let app = setup_test_app().await;
    let acme = helpers::auth::create_tenant(app.pool(), "acme").await;
    let globex = helpers::auth::create_tenant(app.pool(), "globex").await;

    let document_id = fixtures::upload_document(app.client(), &acme.api_key, "Acme only").await;

    let response = app
        .client()
        .get(&api_path(&format!("/documents/{}", document_id)))
        .add_header("X-API-Key", globex.api_key.as_str())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_requests_without_api_key_are_unauthorized() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/documents")).await;
    response.assert_status_unauthorized();
}
