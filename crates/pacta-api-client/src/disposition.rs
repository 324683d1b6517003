//! Disposition resolver: after analysis completes, commit the document
//! either into a brand-new contract (via a prefill snapshot that seeds the
//! wizard) or onto an existing contract as a non-primary attachment.

use uuid::Uuid;

use crate::error::ClientError;
use crate::{api_prefix, ApiClient};
use pacta_core::models::{
    confidence_summary, AnalysisResponse, AttachDocumentRequest, ConfidencePolicy,
    ContractDocumentResponse, ContractResponse, CreatePrefillRequest, DocumentRole, Envelope,
    PrefillResponse,
};

/// A candidate contract for the attach flow. The suggested entry (server-side
/// fuzzy match) is flagged and sorted first, but the user may pick any.
#[derive(Debug)]
pub struct ContractChoice {
    pub contract: ContractResponse,
    pub suggested: bool,
}

pub struct DispositionResolver {
    client: ApiClient,
    confidence_policy: ConfidencePolicy,
}

impl DispositionResolver {
    pub fn new(client: ApiClient) -> Self {
        Self::with_policy(client, ConfidencePolicy::default())
    }

    pub fn with_policy(client: ApiClient, confidence_policy: ConfidencePolicy) -> Self {
        Self {
            client,
            confidence_policy,
        }
    }

    /// Stash the extracted fields as a prefill and return it; the wizard is
    /// then opened from the prefill id.
    pub async fn create_from_analysis(
        &self,
        analysis: &AnalysisResponse,
    ) -> Result<PrefillResponse, ClientError> {
        let request = CreatePrefillRequest {
            document_id: analysis.document_id,
            analysis_id: Some(analysis.id),
            fields: analysis.fields.clone(),
            confidence: analysis.confidence.clone(),
        };

        let envelope: Envelope<PrefillResponse> = self
            .client
            .post_json(&format!("{}/contracts/prefill", api_prefix()), &request)
            .await?;
        Ok(envelope.data)
    }

    /// Attach the analyzed document to an existing contract. The attachment
    /// is never primary, and its notes snapshot the per-field confidence at
    /// attachment time as a point-in-time audit trail.
    pub async fn attach_to_existing(
        &self,
        contract_id: Uuid,
        analysis: &AnalysisResponse,
        document_role: DocumentRole,
    ) -> Result<ContractDocumentResponse, ClientError> {
        let request = AttachDocumentRequest {
            document_id: analysis.document_id,
            document_role,
            is_primary: false,
            notes: Some(confidence_summary(
                &analysis.confidence,
                self.confidence_policy,
            )),
            effective_date: analysis.fields.effective_date,
        };

        let envelope: Envelope<ContractDocumentResponse> = self
            .client
            .post_json(
                &format!("{}/contracts/{}/documents", api_prefix(), contract_id),
                &request,
            )
            .await?;
        Ok(envelope.data)
    }

    /// Contracts the user can attach to, with the analysis suggestion (if
    /// any) flagged and sorted first.
    pub async fn attachment_candidates(
        &self,
        analysis: &AnalysisResponse,
    ) -> Result<Vec<ContractChoice>, ClientError> {
        let contracts: Vec<ContractResponse> = self
            .client
            .get_data(&format!("{}/contracts", api_prefix()), &[])
            .await?;

        let mut choices: Vec<ContractChoice> = contracts
            .into_iter()
            .map(|contract| {
                let suggested = analysis.suggested_contract_id == Some(contract.id);
                ContractChoice {
                    contract,
                    suggested,
                }
            })
            .collect();
        choices.sort_by_key(|choice| !choice.suggested);
        Ok(choices)
    }
}
