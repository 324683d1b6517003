//! End-to-end pipeline: upload, analysis, prefill, contract creation,
//! obligations, and the primary attachment.

mod helpers;

use std::time::Duration;

use helpers::{api_path, fixtures, setup_test_app};
use serde_json::{json, Value};

/// Poll the analysis endpoint until a terminal status or the deadline.
async fn wait_for_analysis(
    app: &helpers::TestApp,
    api_key: &str,
    analysis_id: &str,
) -> Value {
    for _ in 0..100 {
        let response = app
            .client()
            .get(&api_path(&format!(
                "/contracts/upload/analysis/{}",
                analysis_id
            )))
            .add_header("X-API-Key", api_key)
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let status = body["data"]["status"].as_str().expect("status").to_string();
        if status == "COMPLETED" || status == "FAILED" {
            return body["data"].clone();
        }
        // While pending/processing, extracted fields are never populated
        assert!(body["data"]["fields"]
            .as_object()
            .expect("fields object")
            .is_empty());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("analysis did not reach a terminal status in time");
}

#[tokio::test]
async fn test_upload_analyze_prefill_wizard_pipeline() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    // 1. Upload "MSA.pdf" with title "Vendor MSA"
    let document_id =
        fixtures::upload_document(app.client(), &tenant.api_key, "Vendor MSA").await;

    // 2. Request analysis; worker (static provider) completes it out-of-band
    let response = app
        .client()
        .post(&api_path(&format!(
            "/contracts/upload/analyze/{}",
            document_id
        )))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    let analysis_id = body["analysis"]["id"].as_str().expect("analysis id").to_string();
    let status = body["status"].as_str().expect("status");
    assert!(status == "PENDING" || status == "PROCESSING");

    // Re-requesting while non-terminal returns the same analysis, not a new one
    let response = app
        .client()
        .post(&api_path(&format!(
            "/contracts/upload/analyze/{}",
            document_id
        )))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let again: Value = response.json();
    let again_id = again["analysis"]["id"].as_str().expect("analysis id");
    let again_status = again["status"].as_str().expect("status");
    if again_status == "PENDING" || again_status == "PROCESSING" {
        assert_eq!(again_id, analysis_id);
    }

    // 3. Poll to completion
    let analysis = wait_for_analysis(&app, &tenant.api_key, &analysis_id).await;
    assert_eq!(analysis["status"], json!("COMPLETED"));
    assert_eq!(analysis["fields"]["counterparty_name"], json!("Acme Corp"));
    assert_eq!(analysis["fields"]["effective_date"], json!("2024-01-01"));
    assert!(analysis["confidence"]["counterparty_name"].as_f64().unwrap() > 0.9);

    // 4. Stash extracted fields as a prefill and verify the round-trip
    let response = app
        .client()
        .post(&api_path("/contracts/prefill"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "document_id": document_id,
            "analysis_id": analysis_id,
            "fields": analysis["fields"],
            "confidence": analysis["confidence"]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let prefill_id = body["data"]["id"].as_str().expect("prefill id").to_string();

    let response = app
        .client()
        .get(&api_path(&format!("/contracts/prefill/{}", prefill_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["data"]["document_id"],
        json!(document_id.to_string())
    );
    assert_eq!(
        body["data"]["fields"]["counterparty_name"],
        json!("Acme Corp")
    );
    assert_eq!(
        body["data"]["fields"]["effective_date"],
        json!("2024-01-01")
    );

    // 5. Wizard Details: create the contract from the prefilled fields
    let response = app
        .client()
        .post(&api_path("/contracts"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "contract_type": "service_agreement",
            "counterparty_name": body["data"]["fields"]["counterparty_name"],
            "effective_date": body["data"]["fields"]["effective_date"]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let contract_id = body["data"]["id"].as_str().expect("contract id").to_string();

    // 6. Wizard Review: persist obligations and the primary attachment
    let response = app
        .client()
        .put(&api_path(&format!("/contracts/{}/obligations", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!([
            {"title": "Quarterly service report", "obligation_type": "reporting", "recurrence": "quarterly"}
        ]))
        .await;
    response.assert_status_ok();

    let response = app
        .client()
        .post(&api_path(&format!("/contracts/{}/documents", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "document_id": document_id,
            "document_role": "main",
            "is_primary": true
        }))
        .await;
    response.assert_status_ok();

    // 7. Final state: DRAFT contract with the extracted counterparty and one
    // primary attachment pointing at the uploaded document
    let response = app
        .client()
        .get(&api_path(&format!("/contracts/{}", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["counterparty_name"], json!("Acme Corp"));
    assert_eq!(body["data"]["status"], json!("DRAFT"));
    assert_eq!(body["data"]["effective_date"], json!("2024-01-01"));

    let response = app
        .client()
        .get(&api_path(&format!("/contracts/{}/documents", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let attachments = body["data"].as_array().expect("array");
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["document_id"], json!(document_id.to_string()));
    assert_eq!(attachments[0]["is_primary"], json!(true));
}

#[tokio::test]
async fn test_analyze_unknown_document_is_404() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .post(&api_path(&format!(
            "/contracts/upload/analyze/{}",
            uuid::Uuid::new_v4()
        )))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_poll_unknown_analysis_is_404() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .get(&api_path(&format!(
            "/contracts/upload/analysis/{}",
            uuid::Uuid::new_v4()
        )))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_prefill_requires_existing_document() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .post(&api_path("/contracts/prefill"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"document_id": uuid::Uuid::new_v4()}))
        .await;
    response.assert_status_not_found();

    // Missing document_id entirely is a body validation failure
    let response = app
        .client()
        .post(&api_path("/contracts/prefill"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"fields": {}}))
        .await;
    response.assert_status_bad_request();
}
