pub mod analysis;
pub mod attachment;
pub mod contract;
pub mod document;
pub mod envelope;
pub mod obligation;
pub mod prefill;
pub mod tenant;

pub use analysis::{
    confidence_summary, AnalysisResponse, AnalysisResult, AnalysisStatus, ConfidenceLevel,
    ConfidenceMap, ConfidencePolicy, ExtractedFields,
};
pub use attachment::{
    AttachDocumentRequest, ContractDocument, ContractDocumentResponse, DocumentRole,
};
pub use contract::{
    validate_date_order, Contract, ContractResponse, ContractStatus, CreateContractRequest,
    UpdateContractRequest,
};
pub use document::{Document, DocumentMetadata, DocumentResponse, UpdateDocumentRequest};
pub use envelope::Envelope;
pub use obligation::{
    Obligation, ObligationInput, ObligationResponse, ObligationStatus, ObligationType,
    RecurrencePattern,
};
pub use prefill::{ContractPrefill, CreatePrefillRequest, PrefillResponse};
pub use tenant::Tenant;
