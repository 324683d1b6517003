//! Everything a worker needs to process one analysis: repositories, the
//! storage backend holding the document bytes, and the extraction provider.

use std::sync::Arc;

use pacta_db::{AnalysisRepository, ContractRepository, DocumentRepository};
use pacta_extraction::ExtractionProvider;
use pacta_storage::Storage;

#[derive(Clone)]
pub struct AnalysisContext {
    pub analyses: AnalysisRepository,
    pub documents: DocumentRepository,
    pub contracts: ContractRepository,
    pub storage: Arc<dyn Storage>,
    pub provider: Arc<dyn ExtractionProvider>,
}

impl AnalysisContext {
    pub fn new(
        analyses: AnalysisRepository,
        documents: DocumentRepository,
        contracts: ContractRepository,
        storage: Arc<dyn Storage>,
        provider: Arc<dyn ExtractionProvider>,
    ) -> Self {
        Self {
            analyses,
            documents,
            contracts,
            storage,
            provider,
        }
    }
}
