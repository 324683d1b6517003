//! Analysis repository: lifecycle of AI extraction runs.
//!
//! Rows are created `PENDING` by the analyze endpoint and mutated only by
//! the worker afterwards. Claiming uses `FOR UPDATE SKIP LOCKED` so several
//! workers can drain the queue without double-processing.

use chrono::{DateTime, Utc};
use pacta_core::models::{AnalysisResult, AnalysisStatus, ConfidenceMap, ExtractedFields};
use pacta_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for contract_analyses table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub status: String,
    pub fields: serde_json::Value,
    pub confidence: serde_json::Value,
    pub suggested_contract_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub requested_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRow {
    pub fn to_analysis(self) -> Result<AnalysisResult, AppError> {
        Ok(AnalysisResult {
            id: self.id,
            document_id: self.document_id,
            tenant_id: self.tenant_id,
            status: self
                .status
                .parse::<AnalysisStatus>()
                .map_err(|e| AppError::Internal(format!("Invalid analysis status: {}", e)))?,
            fields: serde_json::from_value::<ExtractedFields>(self.fields)
                .map_err(|e| AppError::Internal(format!("Invalid extracted fields: {}", e)))?,
            confidence: serde_json::from_value::<ConfidenceMap>(self.confidence)
                .map_err(|e| AppError::Internal(format!("Invalid confidence map: {}", e)))?,
            suggested_contract_id: self.suggested_contract_id,
            error_message: self.error_message,
            retry_count: self.retry_count,
            requested_at: self.requested_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

const ANALYSIS_COLUMNS: &str = "id, document_id, tenant_id, status, fields, confidence, \
     suggested_contract_id, error_message, retry_count, requested_at, started_at, completed_at";

/// Repository for contract_analyses table.
#[derive(Clone)]
pub struct AnalysisRepository {
    pool: PgPool,
}

impl AnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING analysis for a document.
    #[tracing::instrument(skip(self), fields(db.table = "contract_analyses"))]
    pub async fn create_pending(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<AnalysisResult, AppError> {
        let row: AnalysisRow = sqlx::query_as::<Postgres, AnalysisRow>(&format!(
            r#"
            INSERT INTO contract_analyses (document_id, tenant_id, status)
            VALUES ($1, $2, 'PENDING')
            RETURNING {}
            "#,
            ANALYSIS_COLUMNS
        ))
        .bind(document_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        row.to_analysis()
    }

    /// Fetch an analysis by id, scoped to the tenant.
    #[tracing::instrument(skip(self), fields(db.table = "contract_analyses", db.record_id = %id))]
    pub async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AnalysisResult>, AppError> {
        let row: Option<AnalysisRow> = sqlx::query_as::<Postgres, AnalysisRow>(&format!(
            "SELECT {} FROM contract_analyses WHERE tenant_id = $1 AND id = $2",
            ANALYSIS_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_analysis()).transpose()
    }

    /// Find a non-terminal analysis for a document, if one exists. The
    /// analyze endpoint returns it instead of queueing a duplicate run.
    #[tracing::instrument(skip(self), fields(db.table = "contract_analyses"))]
    pub async fn find_active_for_document(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<AnalysisResult>, AppError> {
        let row: Option<AnalysisRow> = sqlx::query_as::<Postgres, AnalysisRow>(&format!(
            r#"
            SELECT {}
            FROM contract_analyses
            WHERE tenant_id = $1 AND document_id = $2
              AND status IN ('PENDING', 'PROCESSING')
            ORDER BY requested_at DESC
            LIMIT 1
            "#,
            ANALYSIS_COLUMNS
        ))
        .bind(tenant_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_analysis()).transpose()
    }

    /// Claim the next runnable PENDING analysis and mark it PROCESSING.
    /// `FOR UPDATE SKIP LOCKED` lets concurrent workers claim disjoint rows.
    #[tracing::instrument(skip(self), fields(db.table = "contract_analyses"))]
    pub async fn claim_next(&self) -> Result<Option<AnalysisResult>, AppError> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM contract_analyses
            WHERE status = 'PENDING' AND next_attempt_at <= now()
            ORDER BY requested_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id,)) = claimed else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        let row: AnalysisRow = sqlx::query_as::<Postgres, AnalysisRow>(&format!(
            r#"
            UPDATE contract_analyses
            SET status = 'PROCESSING', started_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            ANALYSIS_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.to_analysis().map(Some)
    }

    /// Mark an analysis COMPLETED with its extracted fields and confidence.
    #[tracing::instrument(skip(self, fields, confidence), fields(db.table = "contract_analyses", db.record_id = %id))]
    pub async fn complete(
        &self,
        id: Uuid,
        fields: &ExtractedFields,
        confidence: &ConfidenceMap,
        suggested_contract_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE contract_analyses
            SET status = 'COMPLETED',
                fields = $2,
                confidence = $3,
                suggested_contract_id = $4,
                error_message = NULL,
                completed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(serde_json::to_value(fields)?)
        .bind(serde_json::to_value(confidence)?)
        .bind(suggested_contract_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Send a failed attempt back to PENDING with a retry backoff.
    #[tracing::instrument(skip(self, error_message), fields(db.table = "contract_analyses", db.record_id = %id))]
    pub async fn requeue(
        &self,
        id: Uuid,
        error_message: &str,
        backoff_seconds: u64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE contract_analyses
            SET status = 'PENDING',
                retry_count = retry_count + 1,
                error_message = $2,
                next_attempt_at = now() + make_interval(secs => $3)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(backoff_seconds as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark an analysis terminally FAILED.
    #[tracing::instrument(skip(self, error_message), fields(db.table = "contract_analyses", db.record_id = %id))]
    pub async fn fail(&self, id: Uuid, error_message: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE contract_analyses
            SET status = 'FAILED',
                error_message = $2,
                completed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
