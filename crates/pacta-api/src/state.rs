//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`, and to avoid a single god object with
//! duplicate repositories.

use pacta_core::Config;
use pacta_db::{
    AnalysisRepository, AttachmentRepository, ContractRepository, DocumentRepository,
    ObligationRepository, PrefillRepository, TenantRepository,
};
use pacta_storage::Storage;
use pacta_worker::AnalysisQueue;
use sqlx::PgPool;
use std::sync::Arc;

// ----- Sub-state types -----

/// Database pool and all repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub tenant_repository: TenantRepository,
    pub document_repository: DocumentRepository,
    pub contract_repository: ContractRepository,
    pub obligation_repository: ObligationRepository,
    pub attachment_repository: AttachmentRepository,
    pub analysis_repository: AnalysisRepository,
    pub prefill_repository: PrefillRepository,
}

/// Document upload configuration and storage backend.
#[derive(Clone)]
pub struct DocumentConfig {
    pub storage: Arc<dyn Storage>,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub documents: DocumentConfig,
    /// Keeps the worker pool alive for the lifetime of the app.
    pub analysis_queue: Arc<AnalysisQueue>,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for DocumentConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.documents.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
