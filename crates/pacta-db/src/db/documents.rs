//! Document repository: CRUD for uploaded document records.
//!
//! The stored file is immutable after creation; only descriptive metadata
//! can be updated.

use chrono::{DateTime, Utc};
use pacta_core::models::{Document, UpdateDocumentRequest};
use pacta_core::{AppError, StorageBackend};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for documents table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_confidential: bool,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_backend: String,
    pub storage_key: String,
    pub storage_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn to_document(self) -> Result<Document, AppError> {
        Ok(Document {
            id: self.id,
            tenant_id: self.tenant_id,
            title: self.title,
            document_type: self.document_type,
            description: self.description,
            tags: self.tags,
            is_confidential: self.is_confidential,
            original_filename: self.original_filename,
            stored_filename: self.stored_filename,
            content_type: self.content_type,
            file_size: self.file_size,
            storage_backend: self
                .storage_backend
                .parse::<StorageBackend>()
                .map_err(|e| AppError::Internal(format!("Invalid storage backend: {}", e)))?,
            storage_key: self.storage_key,
            storage_url: self.storage_url,
            uploaded_at: self.uploaded_at,
            updated_at: self.updated_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str = "id, tenant_id, title, document_type, description, tags, \
     is_confidential, original_filename, stored_filename, content_type, file_size, \
     storage_backend, storage_key, storage_url, uploaded_at, updated_at";

/// Parameters for inserting a document after a successful storage write.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub tenant_id: Uuid,
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_confidential: bool,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_backend: StorageBackend,
    pub storage_key: String,
    pub storage_url: String,
}

/// Repository for documents table.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new document record and return it.
    #[tracing::instrument(skip(self, document), fields(db.table = "documents"))]
    pub async fn create(&self, document: NewDocument) -> Result<Document, AppError> {
        let row: DocumentRow = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (
                tenant_id, title, document_type, description, tags, is_confidential,
                original_filename, stored_filename, content_type, file_size,
                storage_backend, storage_key, storage_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document.tenant_id)
        .bind(&document.title)
        .bind(&document.document_type)
        .bind(&document.description)
        .bind(&document.tags)
        .bind(document.is_confidential)
        .bind(&document.original_filename)
        .bind(&document.stored_filename)
        .bind(&document.content_type)
        .bind(document.file_size)
        .bind(document.storage_backend.to_string())
        .bind(&document.storage_key)
        .bind(&document.storage_url)
        .fetch_one(&self.pool)
        .await?;
        row.to_document()
    }

    /// Fetch a document by id, scoped to the tenant.
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.record_id = %id))]
    pub async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE tenant_id = $1 AND id = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_document()).transpose()
    }

    /// List documents for a tenant, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "documents"))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError> {
        let rows: Vec<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            SELECT {}
            FROM documents
            WHERE tenant_id = $1
            ORDER BY uploaded_at DESC
            LIMIT $2 OFFSET $3
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.to_document()).collect()
    }

    /// Update document metadata. The stored file is immutable; only the
    /// descriptive columns can change. Returns None when the id does not
    /// resolve within the tenant.
    #[tracing::instrument(skip(self, update), fields(db.table = "documents", db.record_id = %id))]
    pub async fn update_metadata(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: &UpdateDocumentRequest,
    ) -> Result<Option<Document>, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($3, title),
                document_type = COALESCE($4, document_type),
                description = COALESCE($5, description),
                tags = COALESCE($6, tags),
                is_confidential = COALESCE($7, is_confidential),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(&update.title)
        .bind(&update.document_type)
        .bind(&update.description)
        .bind(&update.tags)
        .bind(update.is_confidential)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_document()).transpose()
    }
}
