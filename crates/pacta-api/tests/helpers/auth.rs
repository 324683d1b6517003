//! Tenant and API-key helpers for integration tests.

use pacta_api::auth::{generate_api_key, hash_api_key};
use pacta_db::TenantRepository;

/// A tenant created for one test, with its raw API key.
pub struct TestTenant {
    pub id: uuid::Uuid,
    pub api_key: String,
}

/// Create a tenant and return its raw API key for request headers.
pub async fn create_tenant(pool: &sqlx::PgPool, name: &str) -> TestTenant {
    let api_key = generate_api_key();
    let tenant = TenantRepository::new(pool.clone())
        .create(name.to_string(), hash_api_key(&api_key))
        .await
        .expect("Failed to create test tenant");

    TestTenant {
        id: tenant.id,
        api_key,
    }
}
