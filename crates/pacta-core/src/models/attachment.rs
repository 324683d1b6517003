use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role of a document within a contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Main,
    Amendment,
    Exhibit,
    Schedule,
    Correspondence,
    Other,
}

impl Display for DocumentRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentRole::Main => write!(f, "main"),
            DocumentRole::Amendment => write!(f, "amendment"),
            DocumentRole::Exhibit => write!(f, "exhibit"),
            DocumentRole::Schedule => write!(f, "schedule"),
            DocumentRole::Correspondence => write!(f, "correspondence"),
            DocumentRole::Other => write!(f, "other"),
        }
    }
}

impl FromStr for DocumentRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(DocumentRole::Main),
            "amendment" => Ok(DocumentRole::Amendment),
            "exhibit" => Ok(DocumentRole::Exhibit),
            "schedule" => Ok(DocumentRole::Schedule),
            "correspondence" => Ok(DocumentRole::Correspondence),
            "other" => Ok(DocumentRole::Other),
            _ => Err(anyhow::anyhow!("Invalid document role: {}", s)),
        }
    }
}

/// Link between a contract and a document. A document is referenced, never
/// owned: deleting the link leaves the document untouched. At most one link
/// per contract is primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub document_role: DocumentRole,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub attached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachDocumentRequest {
    pub document_id: Uuid,
    #[serde(default = "default_role")]
    pub document_role: DocumentRole,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
}

fn default_role() -> DocumentRole {
    DocumentRole::Other
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContractDocumentResponse {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub document_id: Uuid,
    pub document_role: DocumentRole,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub attached_at: DateTime<Utc>,
}

impl From<ContractDocument> for ContractDocumentResponse {
    fn from(link: ContractDocument) -> Self {
        ContractDocumentResponse {
            id: link.id,
            contract_id: link.contract_id,
            document_id: link.document_id,
            document_role: link.document_role,
            is_primary: link.is_primary,
            notes: link.notes,
            effective_date: link.effective_date,
            attached_at: link.attached_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [
            DocumentRole::Main,
            DocumentRole::Amendment,
            DocumentRole::Exhibit,
            DocumentRole::Schedule,
            DocumentRole::Correspondence,
            DocumentRole::Other,
        ] {
            assert_eq!(role.to_string().parse::<DocumentRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_attach_request_defaults() {
        let request: AttachDocumentRequest =
            serde_json::from_str(&format!(r#"{{"document_id":"{}"}}"#, Uuid::new_v4())).unwrap();
        assert_eq!(request.document_role, DocumentRole::Other);
        assert!(!request.is_primary);
    }
}
