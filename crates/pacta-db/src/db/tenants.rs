//! Tenant repository: lookup and creation for API-key tenancy.

use chrono::{DateTime, Utc};
use pacta_core::models::Tenant;
use pacta_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row type for tenants table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub api_key_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TenantRow {
    pub fn to_tenant(self) -> Tenant {
        Tenant {
            id: self.id,
            name: self.name,
            api_key_hash: self.api_key_hash,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Repository for tenants table.
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new tenant and return it.
    #[tracing::instrument(skip(self, api_key_hash), fields(db.table = "tenants"))]
    pub async fn create(&self, name: String, api_key_hash: String) -> Result<Tenant, AppError> {
        let row: TenantRow = sqlx::query_as::<Postgres, TenantRow>(
            r#"
            INSERT INTO tenants (name, api_key_hash)
            VALUES ($1, $2)
            RETURNING id, name, api_key_hash, is_active, created_at
            "#,
        )
        .bind(&name)
        .bind(&api_key_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.to_tenant())
    }

    /// Fetch a tenant by id.
    #[tracing::instrument(skip(self), fields(db.table = "tenants", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let row: Option<TenantRow> = sqlx::query_as::<Postgres, TenantRow>(
            "SELECT id, name, api_key_hash, is_active, created_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.to_tenant()))
    }

    /// Resolve an active tenant from an API key hash. Returns None for
    /// unknown keys and for deactivated tenants alike.
    #[tracing::instrument(skip(self, api_key_hash), fields(db.table = "tenants"))]
    pub async fn find_by_api_key_hash(
        &self,
        api_key_hash: &str,
    ) -> Result<Option<Tenant>, AppError> {
        let row: Option<TenantRow> = sqlx::query_as::<Postgres, TenantRow>(
            r#"
            SELECT id, name, api_key_hash, is_active, created_at
            FROM tenants
            WHERE api_key_hash = $1 AND is_active
            "#,
        )
        .bind(api_key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.to_tenant()))
    }
}
