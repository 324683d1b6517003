use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::contracts::fetch_contract;
use crate::handlers::documents::fetch_document;
use crate::state::AppState;
use pacta_core::models::{AttachDocumentRequest, ContractDocumentResponse, Envelope};

#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}/documents",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Documents attached to the contract", body = Envelope<Vec<ContractDocumentResponse>>),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<ContractDocumentResponse>>>, HttpAppError> {
    fetch_contract(&state, tenant_ctx.tenant_id, contract_id).await?;

    let attachments = state
        .db
        .attachment_repository
        .list_for_contract(tenant_ctx.tenant_id, contract_id)
        .await?;
    Ok(Json(Envelope::ok(
        attachments
            .into_iter()
            .map(ContractDocumentResponse::from)
            .collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/{id}/documents",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = AttachDocumentRequest,
    responses(
        (status = 200, description = "Created attachment", body = Envelope<ContractDocumentResponse>),
        (status = 404, description = "Contract or document not found", body = ErrorResponse),
        (status = 409, description = "Document already attached", body = ErrorResponse)
    )
)]
pub async fn attach_document(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(contract_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AttachDocumentRequest>,
) -> Result<Json<Envelope<ContractDocumentResponse>>, HttpAppError> {
    // Both ids must resolve before the insert so stale references surface
    // as 404 rather than a foreign-key 500.
    fetch_contract(&state, tenant_ctx.tenant_id, contract_id).await?;
    fetch_document(&state, tenant_ctx.tenant_id, request.document_id).await?;

    let attachment = state
        .db
        .attachment_repository
        .attach(tenant_ctx.tenant_id, contract_id, &request)
        .await?;

    tracing::info!(
        contract_id = %contract_id,
        document_id = %request.document_id,
        is_primary = request.is_primary,
        "Document attached to contract"
    );

    Ok(Json(Envelope::ok(ContractDocumentResponse::from(
        attachment,
    ))))
}
