use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use pacta_core::models::{
    Document, DocumentMetadata, DocumentResponse, Envelope, UpdateDocumentRequest,
};
use pacta_core::{AppError, DocumentValidator, FieldError};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// One parsed multipart upload: file bytes plus the metadata form fields.
struct UploadForm {
    filename: String,
    content_type: String,
    data: Vec<u8>,
    metadata: DocumentMetadata,
}

/// Pull the file part and metadata fields out of the multipart body.
/// Tags arrive comma-delimited and are split here, at the boundary.
async fn parse_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut metadata = DocumentMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::BadRequest("File part has no filename".to_string()))?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((filename, content_type, data.to_vec()));
            }
            "title" => {
                metadata.title = read_text_field(field).await?;
            }
            "type" | "document_type" => {
                metadata.document_type = read_text_field(field).await?;
            }
            "description" => {
                let text = read_text_field(field).await?;
                if !text.is_empty() {
                    metadata.description = Some(text);
                }
            }
            "tags" => {
                metadata.tags = DocumentMetadata::parse_tags(&read_text_field(field).await?);
            }
            "is_confidential" => {
                metadata.is_confidential = read_text_field(field).await?.to_lowercase() == "true";
            }
            _ => {
                // Unknown form fields are ignored, matching lenient form handling
            }
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::field("file", "A file is required"))?;

    Ok(UploadForm {
        filename,
        content_type,
        data,
        metadata,
    })
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| AppError::BadRequest(format!("Malformed form field: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document uploaded successfully", body = Envelope<DocumentResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    multipart: Multipart,
) -> Result<Json<Envelope<DocumentResponse>>, HttpAppError> {
    let form = parse_upload_form(multipart).await?;

    let mut field_errors: Vec<FieldError> = Vec::new();
    if form.metadata.title.is_empty() {
        field_errors.push(FieldError::new("title", "Title is required"));
    }
    if !field_errors.is_empty() {
        return Err(AppError::validation(field_errors).into());
    }

    let validator = DocumentValidator::new(
        state.documents.max_file_size,
        state.documents.allowed_extensions.clone(),
        state.documents.allowed_content_types.clone(),
    );
    validator.validate_all(&form.filename, &form.content_type, form.data.len())?;

    // Stored filename is a fresh UUID; the original name survives as metadata.
    let extension = std::path::Path::new(&form.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    let stored_filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_size = form.data.len() as i64;

    let (storage_key, storage_url) = state
        .documents
        .storage
        .upload(
            tenant_ctx.tenant_id,
            &stored_filename,
            &form.content_type,
            form.data,
        )
        .await?;

    let document = match state
        .db
        .document_repository
        .create(pacta_db::NewDocument {
            tenant_id: tenant_ctx.tenant_id,
            title: form.metadata.title,
            document_type: form.metadata.document_type,
            description: form.metadata.description,
            tags: form.metadata.tags,
            is_confidential: form.metadata.is_confidential,
            original_filename: form.filename,
            stored_filename,
            content_type: form.content_type,
            file_size,
            storage_backend: state.documents.storage.backend_type(),
            storage_key: storage_key.clone(),
            storage_url,
        })
        .await
    {
        Ok(document) => document,
        Err(e) => {
            // Cleanup storage on database failure
            let storage = state.documents.storage.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = storage.delete(&storage_key).await {
                    tracing::debug!(
                        error = %cleanup_err,
                        storage_key = %storage_key,
                        "Failed to cleanup storage file after DB error"
                    );
                }
            });
            return Err(e.into());
        }
    };

    tracing::info!(
        document_id = %document.id,
        tenant_id = %document.tenant_id,
        file_size = document.file_size,
        "Document uploaded"
    );

    Ok(Json(Envelope::ok(DocumentResponse::from(document))))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (default 50)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Documents for the tenant", body = Envelope<Vec<DocumentResponse>>)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<DocumentResponse>>>, HttpAppError> {
    let documents = state
        .db
        .document_repository
        .list(
            tenant_ctx.tenant_id,
            query.limit.clamp(1, 200),
            query.offset.max(0),
        )
        .await?;
    Ok(Json(Envelope::ok(
        documents.into_iter().map(DocumentResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document metadata", body = Envelope<DocumentResponse>),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<DocumentResponse>>, HttpAppError> {
    let document = fetch_document(&state, tenant_ctx.tenant_id, id).await?;
    Ok(Json(Envelope::ok(DocumentResponse::from(document))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated document metadata", body = Envelope<DocumentResponse>),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    tenant_ctx: TenantContext,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<UpdateDocumentRequest>,
) -> Result<Json<Envelope<DocumentResponse>>, HttpAppError> {
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(AppError::field("title", "Title cannot be empty").into());
        }
    }

    let document = state
        .db
        .document_repository
        .update_metadata(tenant_ctx.tenant_id, id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

    Ok(Json(Envelope::ok(DocumentResponse::from(document))))
}

pub(crate) async fn fetch_document(
    state: &AppState,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Document, AppError> {
    state
        .db
        .document_repository
        .get_by_id(tenant_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
}
