//! OpenAPI documentation aggregation (served through RapiDoc at /docs).

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::handlers::analysis::AnalyzeResponse;
use pacta_core::FieldError;
use pacta_core::models::{
    AnalysisResponse, AnalysisStatus, AttachDocumentRequest, ContractDocumentResponse,
    ContractResponse, ContractStatus, CreateContractRequest, CreatePrefillRequest,
    DocumentResponse, ObligationInput, ObligationResponse, ObligationStatus, ObligationType,
    PrefillResponse, RecurrencePattern, UpdateContractRequest, UpdateDocumentRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::update_document,
        handlers::contracts::list_contracts,
        handlers::contracts::create_contract,
        handlers::contracts::get_contract,
        handlers::contracts::update_contract,
        handlers::obligations::list_obligations,
        handlers::obligations::create_obligation,
        handlers::obligations::replace_obligations,
        handlers::attachments::list_attachments,
        handlers::attachments::attach_document,
        handlers::analysis::start_analysis,
        handlers::analysis::get_analysis,
        handlers::prefills::create_prefill,
        handlers::prefills::get_prefill,
    ),
    components(schemas(
        ErrorResponse,
        FieldError,
        DocumentResponse,
        UpdateDocumentRequest,
        ContractResponse,
        CreateContractRequest,
        UpdateContractRequest,
        ContractStatus,
        ObligationResponse,
        ObligationInput,
        ObligationType,
        ObligationStatus,
        RecurrencePattern,
        ContractDocumentResponse,
        AttachDocumentRequest,
        AnalysisResponse,
        AnalysisStatus,
        AnalyzeResponse,
        CreatePrefillRequest,
        PrefillResponse,
    )),
    tags(
        (name = "documents", description = "Document upload and metadata"),
        (name = "contracts", description = "Contract records"),
        (name = "obligations", description = "Contract obligations"),
        (name = "attachments", description = "Contract-document links"),
        (name = "analysis", description = "AI-assisted field extraction"),
        (name = "prefills", description = "Wizard seeding snapshots"),
    )
)]
pub struct ApiDoc;
