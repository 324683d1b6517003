use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::analysis::{ConfidenceMap, ExtractedFields};

/// Transient server-stored snapshot of AI-extracted fields, keyed by id and
/// used to seed the contract wizard without re-running analysis. Expires
/// after a configured TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractPrefill {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub analysis_id: Option<Uuid>,
    pub fields: ExtractedFields,
    pub confidence: ConfidenceMap,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePrefillRequest {
    /// Document the extracted fields came from. Mandatory: a prefill without
    /// a document cannot seed the attach step of the wizard.
    pub document_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
    #[serde(default)]
    pub fields: ExtractedFields,
    #[serde(default)]
    pub confidence: ConfidenceMap,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrefillResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
    pub fields: ExtractedFields,
    pub confidence: ConfidenceMap,
    pub expires_at: DateTime<Utc>,
}

impl From<ContractPrefill> for PrefillResponse {
    fn from(prefill: ContractPrefill) -> Self {
        PrefillResponse {
            id: prefill.id,
            document_id: prefill.document_id,
            analysis_id: prefill.analysis_id,
            fields: prefill.fields,
            confidence: prefill.confidence,
            expires_at: prefill.expires_at,
        }
    }
}
