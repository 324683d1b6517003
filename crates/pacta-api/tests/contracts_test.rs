mod helpers;

use helpers::{api_path, fixtures, setup_test_app};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_create_contract_defaults_to_draft() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .post(&api_path("/contracts"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "contract_type": "service_agreement",
            "counterparty_name": "Acme Corp",
            "effective_date": "2024-01-01",
            "expiry_date": "2025-12-31",
            "value": 120000.5,
            "currency": "USD"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("DRAFT"));
    assert_eq!(body["data"]["counterparty_name"], json!("Acme Corp"));
    assert_eq!(body["data"]["effective_date"], json!("2024-01-01"));
}

#[tokio::test]
async fn test_create_contract_missing_counterparty_returns_field_error() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .post(&api_path("/contracts"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "contract_type": "service_agreement",
            "counterparty_name": ""
        }))
        .await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    assert_eq!(body["field_errors"][0]["field"], json!("counterparty_name"));
}

#[tokio::test]
async fn test_create_contract_rejects_inverted_dates() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .post(&api_path("/contracts"))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "contract_type": "service_agreement",
            "counterparty_name": "Acme Corp",
            "effective_date": "2025-01-01",
            "expiry_date": "2024-01-01"
        }))
        .await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["field_errors"][0]["field"], json!("expiry_date"));
}

#[tokio::test]
async fn test_patch_merges_and_revalidates() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;
    let contract_id = fixtures::create_contract(app.client(), &tenant.api_key, "Acme Corp").await;

    // Valid patch
    let response = app
        .client()
        .patch(&api_path(&format!("/contracts/{}", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"status": "ACTIVE", "effective_date": "2024-06-01"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], json!("ACTIVE"));
    assert_eq!(body["data"]["counterparty_name"], json!("Acme Corp"));

    // Patch that violates date ordering against the merged record
    let response = app
        .client()
        .patch(&api_path(&format!("/contracts/{}", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"expiry_date": "2024-01-01"}))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_list_contracts_filters_by_status() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;
    let first = fixtures::create_contract(app.client(), &tenant.api_key, "Acme Corp").await;
    fixtures::create_contract(app.client(), &tenant.api_key, "Globex").await;

    let response = app
        .client()
        .patch(&api_path(&format!("/contracts/{}", first)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({"status": "ACTIVE"}))
        .await;
    response.assert_status_ok();

    let response = app
        .client()
        .get(&api_path("/contracts"))
        .add_query_param("status", "ACTIVE")
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let contracts = body["data"].as_array().expect("array");
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0]["counterparty_name"], json!("Acme Corp"));
}

#[tokio::test]
async fn test_get_unknown_contract_is_404() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;

    let response = app
        .client()
        .get(&api_path(&format!("/contracts/{}", Uuid::new_v4())))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_obligation_set_replace_is_atomic() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;
    let contract_id = fixtures::create_contract(app.client(), &tenant.api_key, "Acme Corp").await;

    let response = app
        .client()
        .put(&api_path(&format!("/contracts/{}/obligations", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!([
            {"title": "Pay invoice", "obligation_type": "payment", "due_date": "2024-03-31"},
            {"title": "File report", "obligation_type": "reporting", "recurrence": "quarterly"}
        ]))
        .await;
    response.assert_status_ok();

    // Replace with a single obligation; the old set is gone
    let response = app
        .client()
        .put(&api_path(&format!("/contracts/{}/obligations", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!([
            {"title": "Annual audit", "obligation_type": "compliance", "recurrence": "annual"}
        ]))
        .await;
    response.assert_status_ok();

    let response = app
        .client()
        .get(&api_path(&format!("/contracts/{}/obligations", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let obligations = body["data"].as_array().expect("array");
    assert_eq!(obligations.len(), 1);
    assert_eq!(obligations[0]["title"], json!("Annual audit"));
    assert_eq!(obligations[0]["status"], json!("PENDING"));
}

#[tokio::test]
async fn test_obligation_rejects_unknown_recurrence() {
    let app = setup_test_app().await;
    let tenant = helpers::auth::create_tenant(app.pool(), "acme").await;
    let contract_id = fixtures::create_contract(app.client(), &tenant.api_key, "Acme Corp").await;

    let response = app
        .client()
        .post(&api_path(&format!("/contracts/{}/obligations", contract_id)))
        .add_header("X-API-Key", tenant.api_key.as_str())
        .json(&json!({
            "title": "Send gift basket",
            "obligation_type": "other",
            "recurrence": "fortnightly"
        }))
        .await;
    response.assert_status_bad_request();
}
