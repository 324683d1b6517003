//! Contract repository: CRUD, listing with filters, and the fuzzy candidate
//! query that feeds suggested-contract matching.

use chrono::{DateTime, NaiveDate, Utc};
use pacta_core::models::{Contract, ContractStatus, CreateContractRequest};
use pacta_core::AppError;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for contracts table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ContractRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contract_type: String,
    pub contract_number: Option<String>,
    pub status: String,
    pub counterparty_name: String,
    pub counterparty_address: Option<String>,
    pub counterparty_email: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractRow {
    pub fn to_contract(self) -> Result<Contract, AppError> {
        Ok(Contract {
            id: self.id,
            tenant_id: self.tenant_id,
            contract_type: self.contract_type,
            contract_number: self.contract_number,
            status: self
                .status
                .parse::<ContractStatus>()
                .map_err(|e| AppError::Internal(format!("Invalid contract status: {}", e)))?,
            counterparty_name: self.counterparty_name,
            counterparty_address: self.counterparty_address,
            counterparty_email: self.counterparty_email,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            execution_date: self.execution_date,
            renewal_date: self.renewal_date,
            value: self.value,
            currency: self.currency,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const CONTRACT_COLUMNS: &str = "id, tenant_id, contract_type, contract_number, status, \
     counterparty_name, counterparty_address, counterparty_email, effective_date, expiry_date, \
     execution_date, renewal_date, value, currency, created_by, updated_by, created_at, updated_at";

/// Listing filters for GET /contracts.
#[derive(Debug, Clone, Default)]
pub struct ContractFilters {
    pub status: Option<ContractStatus>,
    pub contract_type: Option<String>,
    pub counterparty: Option<String>,
}

/// Repository for contracts table.
#[derive(Clone)]
pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new contract and return it. Status defaults to DRAFT.
    #[tracing::instrument(skip(self, request), fields(db.table = "contracts"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: &CreateContractRequest,
        created_by: Option<String>,
    ) -> Result<Contract, AppError> {
        let status = request.status.unwrap_or(ContractStatus::Draft);
        let row: ContractRow = sqlx::query_as::<Postgres, ContractRow>(&format!(
            r#"
            INSERT INTO contracts (
                tenant_id, contract_type, contract_number, status,
                counterparty_name, counterparty_address, counterparty_email,
                effective_date, expiry_date, execution_date, renewal_date,
                value, currency, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(&request.contract_type)
        .bind(&request.contract_number)
        .bind(status.to_string())
        .bind(&request.counterparty_name)
        .bind(&request.counterparty_address)
        .bind(&request.counterparty_email)
        .bind(request.effective_date)
        .bind(request.expiry_date)
        .bind(request.execution_date)
        .bind(request.renewal_date)
        .bind(request.value)
        .bind(&request.currency)
        .bind(&created_by)
        .fetch_one(&self.pool)
        .await?;
        row.to_contract()
    }

    /// Fetch a contract by id, scoped to the tenant.
    #[tracing::instrument(skip(self), fields(db.table = "contracts", db.record_id = %id))]
    pub async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Contract>, AppError> {
        let row: Option<ContractRow> = sqlx::query_as::<Postgres, ContractRow>(&format!(
            "SELECT {} FROM contracts WHERE tenant_id = $1 AND id = $2",
            CONTRACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_contract()).transpose()
    }

    /// Persist a merged contract record (after `Contract::apply_update`).
    /// Returns None when the id does not resolve within the tenant.
    #[tracing::instrument(skip(self, contract), fields(db.table = "contracts", db.record_id = %contract.id))]
    pub async fn update(
        &self,
        contract: &Contract,
        updated_by: Option<String>,
    ) -> Result<Option<Contract>, AppError> {
        let row: Option<ContractRow> = sqlx::query_as::<Postgres, ContractRow>(&format!(
            r#"
            UPDATE contracts
            SET contract_type = $3,
                contract_number = $4,
                status = $5,
                counterparty_name = $6,
                counterparty_address = $7,
                counterparty_email = $8,
                effective_date = $9,
                expiry_date = $10,
                execution_date = $11,
                renewal_date = $12,
                value = $13,
                currency = $14,
                updated_by = COALESCE($15, updated_by),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(contract.tenant_id)
        .bind(contract.id)
        .bind(&contract.contract_type)
        .bind(&contract.contract_number)
        .bind(contract.status.to_string())
        .bind(&contract.counterparty_name)
        .bind(&contract.counterparty_address)
        .bind(&contract.counterparty_email)
        .bind(contract.effective_date)
        .bind(contract.expiry_date)
        .bind(contract.execution_date)
        .bind(contract.renewal_date)
        .bind(contract.value)
        .bind(&contract.currency)
        .bind(&updated_by)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.to_contract()).transpose()
    }

    /// List contracts for a tenant with optional filters, newest first.
    #[tracing::instrument(skip(self, filters), fields(db.table = "contracts"))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filters: &ContractFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contract>, AppError> {
        let rows: Vec<ContractRow> = sqlx::query_as::<Postgres, ContractRow>(&format!(
            r#"
            SELECT {}
            FROM contracts
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR contract_type = $3)
              AND ($4::text IS NULL OR counterparty_name ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(filters.status.map(|s| s.to_string()))
        .bind(&filters.contract_type)
        .bind(&filters.counterparty)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.to_contract()).collect()
    }

    /// Candidate query for suggested-contract matching: contracts whose
    /// counterparty or number loosely matches the extracted values. Final
    /// ranking happens in the worker; this only narrows the set.
    #[tracing::instrument(skip(self), fields(db.table = "contracts"))]
    pub async fn find_candidates(
        &self,
        tenant_id: Uuid,
        counterparty_name: Option<&str>,
        contract_number: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Contract>, AppError> {
        let rows: Vec<ContractRow> = sqlx::query_as::<Postgres, ContractRow>(&format!(
            r#"
            SELECT {}
            FROM contracts
            WHERE tenant_id = $1
              AND (
                    ($2::text IS NOT NULL AND counterparty_name ILIKE '%' || $2 || '%')
                 OR ($3::text IS NOT NULL AND contract_number = $3)
              )
            ORDER BY updated_at DESC
            LIMIT $4
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(counterparty_name)
        .bind(contract_number)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.to_contract()).collect()
    }
}
