use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use pacta_core::models::{
    Contract, ContractResponse, ContractStatus, CreateContractRequest, Envelope,
    UpdateContractRequest,
};
use pacta_core::AppError;
use pacta_db::ContractFilters;

#[derive(Debug, Deserialize)]
pub struct ContractListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub contract_type: Option<String>,
    pub counterparty: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts",
    tag = "contracts",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (e.g. DRAFT, ACTIVE)"),
        ("type" = Option<String>, Query, description = "Filter by contract type"),
        ("counterparty" = Option<String>, Query, description = "Counterparty substring filter"),
        ("limit" = Option<i64>, Query, description = "Page size (default 50)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Contracts for the tenant", body = Envelope<Vec<ContractResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
pub async fn list_contracts(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Query(query): Query<ContractListQuery>,
) -> Result<Json<Envelope<Vec<ContractResponse>>>, HttpAppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ContractStatus>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid contract status: {}", s)))
        })
        .transpose()?;

    let filters = ContractFilters {
        status,
        contract_type: query.contract_type,
        counterparty: query.counterparty,
    };

    let contracts = state
        .db
        .contract_repository
        .list(
            tenant_ctx.tenant_id,
            &filters,
            query.limit.clamp(1, 200),
            query.offset.max(0),
        )
        .await?;
    Ok(Json(Envelope::ok(
        contracts.into_iter().map(ContractResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts",
    tag = "contracts",
    request_body = CreateContractRequest,
    responses(
        (status = 200, description = "Created contract", body = Envelope<ContractResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_contract(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    ValidatedJson(request): ValidatedJson<CreateContractRequest>,
) -> Result<Json<Envelope<ContractResponse>>, HttpAppError> {
    let errors = request.validate(state.config.enforce_date_order());
    if !errors.is_empty() {
        return Err(AppError::validation(errors).into());
    }

    let contract = state
        .db
        .contract_repository
        .create(
            tenant_ctx.tenant_id,
            &request,
            Some(tenant_ctx.tenant_name.clone()),
        )
        .await?;

    tracing::info!(
        contract_id = %contract.id,
        tenant_id = %contract.tenant_id,
        "Contract created"
    );

    Ok(Json(Envelope::ok(ContractResponse::from(contract))))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}",
    tag = "contracts",
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Contract", body = Envelope<ContractResponse>),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ContractResponse>>, HttpAppError> {
    let contract = fetch_contract(&state, tenant_ctx.tenant_id, id).await?;
    Ok(Json(Envelope::ok(ContractResponse::from(contract))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/contracts/{id}",
    tag = "contracts",
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = UpdateContractRequest,
    responses(
        (status = 200, description = "Updated contract", body = Envelope<ContractResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn update_contract(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<UpdateContractRequest>,
) -> Result<Json<Envelope<ContractResponse>>, HttpAppError> {
    let mut contract = fetch_contract(&state, tenant_ctx.tenant_id, id).await?;

    // Merge, then validate the merged record so cross-field rules (date
    // ordering) see the full picture, not just the patched fields.
    contract.apply_update(&update);
    let errors = contract.validate(state.config.enforce_date_order());
    if !errors.is_empty() {
        return Err(AppError::validation(errors).into());
    }

    let updated = state
        .db
        .contract_repository
        .update(&contract, Some(tenant_ctx.tenant_name.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))?;

    Ok(Json(Envelope::ok(ContractResponse::from(updated))))
}

pub(crate) async fn fetch_contract(
    state: &AppState,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Contract, AppError> {
    state
        .db
        .contract_repository
        .get_by_id(tenant_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))
}
