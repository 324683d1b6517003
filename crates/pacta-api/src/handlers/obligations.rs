use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::contracts::fetch_contract;
use crate::state::AppState;
use pacta_core::models::{Envelope, ObligationInput, ObligationResponse};
use pacta_core::{AppError, FieldError};

#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}/obligations",
    tag = "obligations",
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Obligations of the contract", body = Envelope<Vec<ObligationResponse>>),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn list_obligations(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<ObligationResponse>>>, HttpAppError> {
    fetch_contract(&state, tenant_ctx.tenant_id, contract_id).await?;

    let obligations = state
        .db
        .obligation_repository
        .list_for_contract(tenant_ctx.tenant_id, contract_id)
        .await?;
    Ok(Json(Envelope::ok(
        obligations
            .into_iter()
            .map(ObligationResponse::from)
            .collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/{id}/obligations",
    tag = "obligations",
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = ObligationInput,
    responses(
        (status = 200, description = "Created obligation", body = Envelope<ObligationResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn create_obligation(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(contract_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<ObligationInput>,
) -> Result<Json<Envelope<ObligationResponse>>, HttpAppError> {
    fetch_contract(&state, tenant_ctx.tenant_id, contract_id).await?;

    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AppError::validation(errors).into());
    }

    let obligation = state
        .db
        .obligation_repository
        .create(tenant_ctx.tenant_id, contract_id, &input)
        .await?;
    Ok(Json(Envelope::ok(ObligationResponse::from(obligation))))
}

#[utoipa::path(
    put,
    path = "/api/v1/contracts/{id}/obligations",
    tag = "obligations",
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = Vec<ObligationInput>,
    responses(
        (status = 200, description = "Replaced obligation set", body = Envelope<Vec<ObligationResponse>>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn replace_obligations(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(contract_id): Path<Uuid>,
    ValidatedJson(inputs): ValidatedJson<Vec<ObligationInput>>,
) -> Result<Json<Envelope<Vec<ObligationResponse>>>, HttpAppError> {
    fetch_contract(&state, tenant_ctx.tenant_id, contract_id).await?;

    let errors: Vec<FieldError> = inputs
        .iter()
        .enumerate()
        .flat_map(|(index, input)| {
            input.validate().into_iter().map(move |e| {
                FieldError::new(format!("obligations[{}].{}", index, e.field), e.message)
            })
        })
        .collect();
    if !errors.is_empty() {
        return Err(AppError::validation(errors).into());
    }

    let obligations = state
        .db
        .obligation_repository
        .replace_for_contract(tenant_ctx.tenant_id, contract_id, &inputs)
        .await?;
    Ok(Json(Envelope::ok(
        obligations
            .into_iter()
            .map(ObligationResponse::from)
            .collect(),
    )))
}
