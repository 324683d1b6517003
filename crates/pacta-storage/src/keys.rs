//! Shared key generation for storage backends.
//!
//! Key format: `documents/{tenant_id}/{filename}`. All backends must use this
//! format for consistency.

use uuid::Uuid;

/// Generate a storage key for the given tenant and filename.
pub fn generate_storage_key(tenant_id: Uuid, filename: &str) -> String {
    format!("documents/{}/{}", tenant_id, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_tenant_scoped() {
        let tenant_id = Uuid::new_v4();
        let key = generate_storage_key(tenant_id, "a1b2.pdf");
        assert_eq!(key, format!("documents/{}/a1b2.pdf", tenant_id));
    }
}
