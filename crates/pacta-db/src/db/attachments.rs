//! Contract-document attachment repository.
//!
//! The `(contract_id, document_id)` unique constraint backs the Conflict
//! semantics: concurrent attach attempts serialize in the database and
//! exactly one wins. A partial unique index keeps at most one primary
//! attachment per contract; attaching a new primary demotes the old one
//! inside the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use pacta_core::models::{AttachDocumentRequest, ContractDocument, DocumentRole};
use pacta_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for contract_documents table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ContractDocumentRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub document_role: String,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub attached_at: DateTime<Utc>,
}

impl ContractDocumentRow {
    pub fn to_contract_document(self) -> Result<ContractDocument, AppError> {
        Ok(ContractDocument {
            id: self.id,
            contract_id: self.contract_id,
            document_id: self.document_id,
            tenant_id: self.tenant_id,
            document_role: self
                .document_role
                .parse::<DocumentRole>()
                .map_err(|e| AppError::Internal(format!("Invalid document role: {}", e)))?,
            is_primary: self.is_primary,
            notes: self.notes,
            effective_date: self.effective_date,
            attached_at: self.attached_at,
        })
    }
}

const ATTACHMENT_COLUMNS: &str = "id, contract_id, document_id, tenant_id, document_role, \
     is_primary, notes, effective_date, attached_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}

/// Repository for contract_documents table.
#[derive(Clone)]
pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List attachments for a contract, primary first.
    #[tracing::instrument(skip(self), fields(db.table = "contract_documents"))]
    pub async fn list_for_contract(
        &self,
        tenant_id: Uuid,
        contract_id: Uuid,
    ) -> Result<Vec<ContractDocument>, AppError> {
        let rows: Vec<ContractDocumentRow> =
            sqlx::query_as::<Postgres, ContractDocumentRow>(&format!(
                r#"
                SELECT {}
                FROM contract_documents
                WHERE tenant_id = $1 AND contract_id = $2
                ORDER BY is_primary DESC, attached_at ASC
                "#,
                ATTACHMENT_COLUMNS
            ))
            .bind(tenant_id)
            .bind(contract_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.to_contract_document()).collect()
    }

    /// Attach a document to a contract.
    ///
    /// Fails with `Conflict` when the document is already attached to that
    /// contract (unique violation). When `is_primary` is requested, any
    /// existing primary attachment is demoted within the same transaction.
    #[tracing::instrument(skip(self, request), fields(db.table = "contract_documents"))]
    pub async fn attach(
        &self,
        tenant_id: Uuid,
        contract_id: Uuid,
        request: &AttachDocumentRequest,
    ) -> Result<ContractDocument, AppError> {
        let mut tx = self.pool.begin().await?;

        if request.is_primary {
            sqlx::query(
                r#"
                UPDATE contract_documents
                SET is_primary = FALSE
                WHERE tenant_id = $1 AND contract_id = $2 AND is_primary
                "#,
            )
            .bind(tenant_id)
            .bind(contract_id)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query_as::<Postgres, ContractDocumentRow>(&format!(
            r#"
            INSERT INTO contract_documents (
                contract_id, document_id, tenant_id, document_role,
                is_primary, notes, effective_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        ))
        .bind(contract_id)
        .bind(request.document_id)
        .bind(tenant_id)
        .bind(request.document_role.to_string())
        .bind(request.is_primary)
        .bind(&request.notes)
        .bind(request.effective_date)
        .fetch_one(&mut *tx)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await.ok();
                return Err(AppError::Conflict(
                    "Document is already attached to this contract".to_string(),
                ));
            }
            Err(err) => {
                tx.rollback().await.ok();
                return Err(err.into());
            }
        };

        tx.commit().await?;
        row.to_contract_document()
    }
}
