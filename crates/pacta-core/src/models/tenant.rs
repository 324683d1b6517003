use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization-scoping identifier for multi-tenant isolation. Every
/// document, contract, and analysis row carries a tenant id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// SHA-256 hex digest of the tenant API key. The raw key is never stored.
    pub api_key_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
