use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::documents::fetch_document;
use crate::state::AppState;
use pacta_core::models::{AnalysisResponse, AnalysisStatus, Envelope};
use pacta_core::AppError;

/// Response for the analyze endpoint: the created (or already-running)
/// analysis plus its status at request time.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: AnalysisResponse,
    pub status: AnalysisStatus,
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/upload/analyze/{document_id}",
    tag = "analysis",
    params(("document_id" = Uuid, Path, description = "Document to analyze")),
    responses(
        (status = 200, description = "Analysis created or already running", body = AnalyzeResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn start_analysis(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(document_id): Path<Uuid>,
) -> Result<Json<AnalyzeResponse>, HttpAppError> {
    fetch_document(&state, tenant_ctx.tenant_id, document_id).await?;

    // Idempotent start: a document with a non-terminal analysis returns that
    // run instead of queueing a duplicate. A new request after a terminal
    // analysis re-runs extraction.
    let analysis = match state
        .db
        .analysis_repository
        .find_active_for_document(tenant_ctx.tenant_id, document_id)
        .await?
    {
        Some(active) => active,
        None => {
            let created = state
                .db
                .analysis_repository
                .create_pending(tenant_ctx.tenant_id, document_id)
                .await?;
            tracing::info!(
                analysis_id = %created.id,
                document_id = %document_id,
                "Analysis queued"
            );
            created
        }
    };

    let status = analysis.status;
    Ok(Json(AnalyzeResponse {
        success: true,
        analysis: AnalysisResponse::from(analysis),
        status,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/upload/analysis/{analysis_id}",
    tag = "analysis",
    params(("analysis_id" = Uuid, Path, description = "Analysis id")),
    responses(
        (status = 200, description = "Current analysis state", body = Envelope<AnalysisResponse>),
        (status = 404, description = "Analysis not found", body = ErrorResponse)
    )
)]
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(analysis_id): Path<Uuid>,
) -> Result<Json<Envelope<AnalysisResponse>>, HttpAppError> {
    let analysis = state
        .db
        .analysis_repository
        .get_by_id(tenant_ctx.tenant_id, analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", analysis_id)))?;

    Ok(Json(Envelope::ok(AnalysisResponse::from(analysis))))
}
