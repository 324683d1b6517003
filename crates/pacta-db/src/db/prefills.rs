//! Prefill repository: transient wizard seeds carrying AI-extracted fields.
//!
//! Prefills expire after a configured TTL. Expired rows are purged
//! opportunistically on create and excluded on read.

use chrono::{DateTime, Duration, Utc};
use pacta_core::models::{ConfidenceMap, ContractPrefill, CreatePrefillRequest, ExtractedFields};
use pacta_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for contract_prefills table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct PrefillRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub analysis_id: Option<Uuid>,
    pub fields: serde_json::Value,
    pub confidence: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PrefillRow {
    pub fn to_prefill(self) -> Result<ContractPrefill, AppError> {
        Ok(ContractPrefill {
            id: self.id,
            tenant_id: self.tenant_id,
            document_id: self.document_id,
            analysis_id: self.analysis_id,
            fields: serde_json::from_value::<ExtractedFields>(self.fields)
                .map_err(|e| AppError::Internal(format!("Invalid prefill fields: {}", e)))?,
            confidence: serde_json::from_value::<ConfidenceMap>(self.confidence)
                .map_err(|e| AppError::Internal(format!("Invalid confidence map: {}", e)))?,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

const PREFILL_COLUMNS: &str =
    "id, tenant_id, document_id, analysis_id, fields, confidence, created_at, expires_at";

/// Repository for contract_prefills table.
#[derive(Clone)]
pub struct PrefillRepository {
    pool: PgPool,
}

impl PrefillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a prefill snapshot with the given TTL. Purges expired rows for
    /// the tenant first so the table stays small without a dedicated sweeper.
    #[tracing::instrument(skip(self, request), fields(db.table = "contract_prefills"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: &CreatePrefillRequest,
        ttl_hours: i64,
    ) -> Result<ContractPrefill, AppError> {
        sqlx::query("DELETE FROM contract_prefills WHERE tenant_id = $1 AND expires_at < now()")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        let expires_at = Utc::now() + Duration::hours(ttl_hours);
        let row: PrefillRow = sqlx::query_as::<Postgres, PrefillRow>(&format!(
            r#"
            INSERT INTO contract_prefills (
                tenant_id, document_id, analysis_id, fields, confidence, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PREFILL_COLUMNS
        ))
        .bind(tenant_id)
        .bind(request.document_id)
        .bind(request.analysis_id)
        .bind(serde_json::to_value(&request.fields)?)
        .bind(serde_json::to_value(&request.confidence)?)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        row.to_prefill()
    }

    /// Fetch a live (unexpired) prefill by id, scoped to the tenant.
    #[tracing::instrument(skip(self), fields(db.table = "contract_prefills", db.record_id = %id))]
    pub async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ContractPrefill>, AppError> {
        let row: Option<PrefillRow> = sqlx::query_as::<Postgres, PrefillRow>(&format!(
            r#"
            SELECT {}
            FROM contract_prefills
            WHERE tenant_id = $1 AND id = $2 AND expires_at > now()
            "#,
            PREFILL_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_prefill()).transpose()
    }
}
