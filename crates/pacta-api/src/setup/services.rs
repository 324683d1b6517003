//! Service and state construction.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;

use crate::state::{AppState, DbState, DocumentConfig};
use pacta_core::Config;
use pacta_db::{
    AnalysisRepository, AttachmentRepository, ContractRepository, DocumentRepository,
    ObligationRepository, PrefillRepository, TenantRepository,
};
use pacta_extraction::create_provider;
use pacta_storage::create_storage;
use pacta_worker::{AnalysisContext, AnalysisQueue, AnalysisQueueConfig};

/// Build the application state: storage, repositories, extraction provider,
/// and the background analysis queue.
pub async fn build_state(config: Config, pool: PgPool) -> Result<Arc<AppState>> {
    let storage = create_storage(&config)
        .await
        .context("Failed to create storage backend")?;

    let tenant_repository = TenantRepository::new(pool.clone());
    let document_repository = DocumentRepository::new(pool.clone());
    let contract_repository = ContractRepository::new(pool.clone());
    let obligation_repository = ObligationRepository::new(pool.clone());
    let attachment_repository = AttachmentRepository::new(pool.clone());
    let analysis_repository = AnalysisRepository::new(pool.clone());
    let prefill_repository = PrefillRepository::new(pool.clone());

    let provider = create_provider(&config).context("Failed to create extraction provider")?;
    tracing::info!(provider = provider.name(), "Extraction provider ready");

    let analysis_context = AnalysisContext::new(
        analysis_repository.clone(),
        document_repository.clone(),
        contract_repository.clone(),
        storage.clone(),
        provider,
    );
    let analysis_queue = AnalysisQueue::new(
        analysis_context,
        AnalysisQueueConfig {
            max_workers: config.analysis_max_workers,
            poll_interval_ms: config.analysis_poll_interval_ms,
            max_retries: config.analysis_max_retries,
            job_timeout_seconds: config.analysis_job_timeout_seconds,
        },
    );

    let is_production = config.is_production();
    let state = AppState {
        db: DbState {
            pool,
            tenant_repository,
            document_repository,
            contract_repository,
            obligation_repository,
            attachment_repository,
            analysis_repository,
            prefill_repository,
        },
        documents: DocumentConfig {
            storage,
            max_file_size: config.max_document_size_bytes(),
            allowed_extensions: config.document_allowed_extensions().to_vec(),
            allowed_content_types: config.document_allowed_content_types().to_vec(),
        },
        analysis_queue: Arc::new(analysis_queue),
        config,
        is_production,
    };

    Ok(Arc::new(state))
}
