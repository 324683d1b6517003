//! Obligation repository: per-contract obligation CRUD and the atomic
//! replace used by the wizard's Review-step submission.

use chrono::{DateTime, NaiveDate, Utc};
use pacta_core::models::{
    Obligation, ObligationInput, ObligationStatus, ObligationType, RecurrencePattern,
};
use pacta_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for obligations table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ObligationRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub obligation_type: String,
    pub responsible_party: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObligationRow {
    pub fn to_obligation(self) -> Result<Obligation, AppError> {
        Ok(Obligation {
            id: self.id,
            contract_id: self.contract_id,
            tenant_id: self.tenant_id,
            title: self.title,
            description: self.description,
            obligation_type: self
                .obligation_type
                .parse::<ObligationType>()
                .map_err(|e| AppError::Internal(format!("Invalid obligation type: {}", e)))?,
            responsible_party: self.responsible_party,
            due_date: self.due_date,
            recurrence: self
                .recurrence
                .map(|r| r.parse::<RecurrencePattern>())
                .transpose()
                .map_err(|e| AppError::Internal(format!("Invalid recurrence: {}", e)))?,
            status: self
                .status
                .parse::<ObligationStatus>()
                .map_err(|e| AppError::Internal(format!("Invalid obligation status: {}", e)))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const OBLIGATION_COLUMNS: &str = "id, contract_id, tenant_id, title, description, \
     obligation_type, responsible_party, due_date, recurrence, status, created_at, updated_at";

/// Repository for obligations table.
#[derive(Clone)]
pub struct ObligationRepository {
    pool: PgPool,
}

impl ObligationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List obligations for a contract, oldest first (stable wizard ordering).
    #[tracing::instrument(skip(self), fields(db.table = "obligations"))]
    pub async fn list_for_contract(
        &self,
        tenant_id: Uuid,
        contract_id: Uuid,
    ) -> Result<Vec<Obligation>, AppError> {
        let rows: Vec<ObligationRow> = sqlx::query_as::<Postgres, ObligationRow>(&format!(
            r#"
            SELECT {}
            FROM obligations
            WHERE tenant_id = $1 AND contract_id = $2
            ORDER BY created_at ASC
            "#,
            OBLIGATION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.to_obligation()).collect()
    }

    /// Insert a single obligation for a contract.
    #[tracing::instrument(skip(self, input), fields(db.table = "obligations"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        contract_id: Uuid,
        input: &ObligationInput,
    ) -> Result<Obligation, AppError> {
        let status = input.status.unwrap_or(ObligationStatus::Pending);
        let row: ObligationRow = sqlx::query_as::<Postgres, ObligationRow>(&format!(
            r#"
            INSERT INTO obligations (
                contract_id, tenant_id, title, description, obligation_type,
                responsible_party, due_date, recurrence, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            OBLIGATION_COLUMNS
        ))
        .bind(contract_id)
        .bind(tenant_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.obligation_type.to_string())
        .bind(&input.responsible_party)
        .bind(input.due_date)
        .bind(input.recurrence.map(|r| r.to_string()))
        .bind(status.to_string())
        .fetch_one(&self.pool)
        .await?;
        row.to_obligation()
    }

    /// Replace the full obligation set of a contract in one transaction.
    /// Used by the wizard's final submission so the persisted list always
    /// matches what the user reviewed.
    #[tracing::instrument(skip(self, inputs), fields(db.table = "obligations", count = inputs.len()))]
    pub async fn replace_for_contract(
        &self,
        tenant_id: Uuid,
        contract_id: Uuid,
        inputs: &[ObligationInput],
    ) -> Result<Vec<Obligation>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM obligations WHERE tenant_id = $1 AND contract_id = $2")
            .bind(tenant_id)
            .bind(contract_id)
            .execute(&mut *tx)
            .await?;

        let mut obligations = Vec::with_capacity(inputs.len());
        for input in inputs {
            let status = input.status.unwrap_or(ObligationStatus::Pending);
            let row: ObligationRow = sqlx::query_as::<Postgres, ObligationRow>(&format!(
                r#"
                INSERT INTO obligations (
                    contract_id, tenant_id, title, description, obligation_type,
                    responsible_party, due_date, recurrence, status
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {}
                "#,
                OBLIGATION_COLUMNS
            ))
            .bind(contract_id)
            .bind(tenant_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.obligation_type.to_string())
            .bind(&input.responsible_party)
            .bind(input.due_date)
            .bind(input.recurrence.map(|r| r.to_string()))
            .bind(status.to_string())
            .fetch_one(&mut *tx)
            .await?;
            obligations.push(row.to_obligation()?);
        }

        tx.commit().await?;
        Ok(obligations)
    }
}
