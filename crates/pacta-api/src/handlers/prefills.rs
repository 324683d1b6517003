use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::documents::fetch_document;
use crate::state::AppState;
use pacta_core::models::{CreatePrefillRequest, Envelope, PrefillResponse};
use pacta_core::AppError;

#[utoipa::path(
    post,
    path = "/api/v1/contracts/prefill",
    tag = "prefills",
    request_body = CreatePrefillRequest,
    responses(
        (status = 200, description = "Stored prefill snapshot", body = Envelope<PrefillResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn create_prefill(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    ValidatedJson(request): ValidatedJson<CreatePrefillRequest>,
) -> Result<Json<Envelope<PrefillResponse>>, HttpAppError> {
    // The document id is the one mandatory prefill field; all contract
    // fields are optional at this stage.
    fetch_document(&state, tenant_ctx.tenant_id, request.document_id).await?;

    let prefill = state
        .db
        .prefill_repository
        .create(
            tenant_ctx.tenant_id,
            &request,
            state.config.prefill_ttl_hours,
        )
        .await?;

    tracing::info!(
        prefill_id = %prefill.id,
        document_id = %prefill.document_id,
        "Prefill stored"
    );

    Ok(Json(Envelope::ok(PrefillResponse::from(prefill))))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/prefill/{id}",
    tag = "prefills",
    params(("id" = Uuid, Path, description = "Prefill id")),
    responses(
        (status = 200, description = "Prefill snapshot", body = Envelope<PrefillResponse>),
        (status = 404, description = "Prefill not found or expired", body = ErrorResponse)
    )
)]
pub async fn get_prefill(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<PrefillResponse>>, HttpAppError> {
    let prefill = state
        .db
        .prefill_repository
        .get_by_id(tenant_ctx.tenant_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prefill {} not found", id)))?;

    Ok(Json(Envelope::ok(PrefillResponse::from(prefill))))
}
