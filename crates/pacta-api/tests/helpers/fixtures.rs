//! Shared fixtures: sample files, upload/create helpers.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use super::api_path;

/// Minimal PDF bytes; enough for upload validation (magic prefix + size).
pub fn sample_pdf(size: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(size.max(data.len()), b' ');
    data
}

/// Multipart form for a document upload.
pub fn upload_form(filename: &str, title: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("type", "contract".to_string())
        .add_text("tags", "vendor, msa".to_string())
        .add_text("is_confidential", "false".to_string())
        .add_part(
            "file",
            Part::bytes(data)
                .file_name(filename.to_string())
                .mime_type("application/pdf"),
        )
}

/// Upload a document and return its id.
pub async fn upload_document(server: &TestServer, api_key: &str, title: &str) -> Uuid {
    let response = server
        .post(&api_path("/documents"))
        .add_header("X-API-Key", api_key)
        .multipart(upload_form("MSA.pdf", title, sample_pdf(4096)))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    body["data"]["id"]
        .as_str()
        .expect("document id")
        .parse()
        .expect("document id is a uuid")
}

/// Create a minimal DRAFT contract and return its id.
pub async fn create_contract(server: &TestServer, api_key: &str, counterparty: &str) -> Uuid {
    let response = server
        .post(&api_path("/contracts"))
        .add_header("X-API-Key", api_key)
        .json(&json!({
            "contract_type": "service_agreement",
            "counterparty_name": counterparty,
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["data"]["id"]
        .as_str()
        .expect("contract id")
        .parse()
        .expect("contract id is a uuid")
}
