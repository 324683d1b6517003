//! API-key tenancy.
//!
//! Every request carries a tenant API key (`X-API-Key` or
//! `Authorization: Bearer`). The auth middleware hashes it, resolves the
//! tenant, and stores a [`TenantContext`] in request extensions; handlers
//! extract it via `FromRequestParts` (Extension cannot be combined with
//! Multipart extractors).

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{request::Parts, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::error::ErrorResponse;
use pacta_db::TenantRepository;

/// Tenant context extracted from the API key and stored in request extensions
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub tenant_name: String,
}

/// State for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub tenant_repository: TenantRepository,
}

/// Generate a new tenant API key: `pk_live_<40 hex chars>`.
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..20).map(|_| rng.random()).collect();
    format!("pk_live_{}", hex::encode(random_bytes))
}

/// Hash an API key for storage and lookup. SHA-256 keeps the lookup
/// deterministic (the hash is the index key) while never storing raw keys.
pub fn hash_api_key(key: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
            error_type: None,
            code: "UNAUTHORIZED".to_string(),
            recoverable: false,
            suggested_action: Some("Check API key or authentication token".to_string()),
            field_errors: None,
        }),
    )
        .into_response()
}

/// Auth middleware: resolve the tenant from the API key and stash the
/// context in request extensions.
pub async fn auth_middleware(
    State(auth): State<std::sync::Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();

    let api_key = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        });

    let Some(api_key) = api_key else {
        return unauthorized("Missing API key");
    };

    let tenant = match auth
        .tenant_repository
        .find_by_api_key_hash(&hash_api_key(&api_key))
        .await
    {
        Ok(Some(tenant)) => tenant,
        Ok(None) => return unauthorized("Invalid or expired API key"),
        Err(e) => {
            tracing::error!(error = %e, "Tenant lookup failed during authentication");
            return unauthorized("Authentication unavailable");
        }
    };

    request.extensions_mut().insert(TenantContext {
        tenant_id: tenant.id,
        tenant_name: tenant.name,
    });

    next.run(request).await
}

// Implement FromRequestParts for TenantContext to work with Multipart
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing tenant context".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_TENANT_CONTEXT".to_string(),
                        recoverable: false,
                        suggested_action: Some(
                            "Check authentication token or API key".to_string(),
                        ),
                        field_errors: None,
                    }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with("pk_live_"));
        assert_eq!(key.len(), "pk_live_".len() + 40);
    }

    #[test]
    fn test_hash_is_deterministic_and_not_plaintext() {
        let key = "pk_live_abc123";
        let hash = hash_api_key(key);
        assert_eq!(hash, hash_api_key(key));
        assert_ne!(hash, key);
        assert_eq!(hash.len(), 64);
    }
}
