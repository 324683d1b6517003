//! Persistence boundary for the contract wizard.
//!
//! The wizard talks to a [`ContractStore`] rather than to `ApiClient`
//! directly so its state machine can be exercised against an in-memory
//! store in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ClientError;
use crate::{api_prefix, ApiClient};
use pacta_core::models::{
    AttachDocumentRequest, ContractDocumentResponse, ContractResponse, CreateContractRequest,
    Envelope, ObligationInput, ObligationResponse, PrefillResponse, UpdateContractRequest,
};

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn create_contract(
        &self,
        request: &CreateContractRequest,
    ) -> Result<ContractResponse, ClientError>;

    async fn update_contract(
        &self,
        id: Uuid,
        request: &UpdateContractRequest,
    ) -> Result<ContractResponse, ClientError>;

    async fn get_contract(&self, id: Uuid) -> Result<ContractResponse, ClientError>;

    async fn list_obligations(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ObligationResponse>, ClientError>;

    async fn replace_obligations(
        &self,
        contract_id: Uuid,
        obligations: &[ObligationInput],
    ) -> Result<Vec<ObligationResponse>, ClientError>;

    async fn attach_document(
        &self,
        contract_id: Uuid,
        request: &AttachDocumentRequest,
    ) -> Result<ContractDocumentResponse, ClientError>;

    async fn get_prefill(&self, id: Uuid) -> Result<PrefillResponse, ClientError>;
}

#[async_trait]
impl ContractStore for ApiClient {
    async fn create_contract(
        &self,
        request: &CreateContractRequest,
    ) -> Result<ContractResponse, ClientError> {
        let envelope: Envelope<ContractResponse> = self
            .post_json(&format!("{}/contracts", api_prefix()), request)
            .await?;
        Ok(envelope.data)
    }

    async fn update_contract(
        &self,
        id: Uuid,
        request: &UpdateContractRequest,
    ) -> Result<ContractResponse, ClientError> {
        let envelope: Envelope<ContractResponse> = self
            .patch_json(&format!("{}/contracts/{}", api_prefix(), id), request)
            .await?;
        Ok(envelope.data)
    }

    async fn get_contract(&self, id: Uuid) -> Result<ContractResponse, ClientError> {
        self.get_data(&format!("{}/contracts/{}", api_prefix(), id), &[])
            .await
    }

    async fn list_obligations(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ObligationResponse>, ClientError> {
        self.get_data(
            &format!("{}/contracts/{}/obligations", api_prefix(), contract_id),
            &[],
        )
        .await
    }

    async fn replace_obligations(
        &self,
        contract_id: Uuid,
        obligations: &[ObligationInput],
    ) -> Result<Vec<ObligationResponse>, ClientError> {
        let envelope: Envelope<Vec<ObligationResponse>> = self
            .put_json(
                &format!("{}/contracts/{}/obligations", api_prefix(), contract_id),
                &obligations,
            )
            .await?;
        Ok(envelope.data)
    }

    async fn attach_document(
        &self,
        contract_id: Uuid,
        request: &AttachDocumentRequest,
    ) -> Result<ContractDocumentResponse, ClientError> {
        let envelope: Envelope<ContractDocumentResponse> = self
            .post_json(
                &format!("{}/contracts/{}/documents", api_prefix(), contract_id),
                request,
            )
            .await?;
        Ok(envelope.data)
    }

    async fn get_prefill(&self, id: Uuid) -> Result<PrefillResponse, ClientError> {
        self.get_data(&format!("{}/contracts/prefill/{}", api_prefix(), id), &[])
            .await
    }
}
