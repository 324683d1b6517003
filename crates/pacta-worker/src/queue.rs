//! Analysis queue: worker pool, polling claim loop, retry with capped
//! backoff, and shutdown.
//!
//! Shutdown: [`AnalysisQueue::shutdown`] signals the pool to stop; it does
//! not wait for in-flight analyses. For graceful shutdown, coordinate with
//! your runtime and allow time for running analyses to finish before
//! process exit.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;

use pacta_core::models::AnalysisResult;
use pacta_extraction::ExtractionOutput;

use crate::context::AnalysisContext;
use crate::suggest::best_suggestion;

/// Maximum delay in seconds before retrying a failed analysis. Caps
/// exponential backoff so that high retry counts do not produce excessively
/// long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    (2_u64.pow(retry_count as u32)).min(MAX_RETRY_BACKOFF_SECS)
}

/// How many candidate contracts to fetch for suggestion ranking.
const SUGGESTION_CANDIDATE_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct AnalysisQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub max_retries: i32,
    /// Per-attempt timeout; a run exceeding it counts as a failed attempt.
    pub job_timeout_seconds: i32,
}

impl Default for AnalysisQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 2,
            poll_interval_ms: 1000,
            max_retries: 3,
            job_timeout_seconds: 300,
        }
    }
}

pub struct AnalysisQueue {
    shutdown_tx: mpsc::Sender<()>,
}

impl AnalysisQueue {
    /// Create a queue and spawn its worker pool.
    pub fn new(context: AnalysisContext, config: AnalysisQueueConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::worker_pool(context, config, shutdown_rx).await;
        });

        Self { shutdown_tx }
    }

    /// Signal the worker pool to stop claiming new analyses.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn worker_pool(
        context: AnalysisContext,
        config: AnalysisQueueConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            provider = context.provider.name(),
            "Analysis worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Analysis worker pool shutting down");
                    break;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(&context, &config, &semaphore).await;
                }
            }
        }

        tracing::info!("Analysis worker pool stopped");
    }

    async fn claim_and_dispatch_one(
        context: &AnalysisContext,
        config: &AnalysisQueueConfig,
        semaphore: &Arc<Semaphore>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match context.analyses.claim_next().await {
            Ok(Some(analysis)) => {
                let ctx = context.clone();
                let cfg = config.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = process_one(&ctx, &cfg, analysis).await {
                        tracing::error!(error = %e, "Analysis processing failed");
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No analyses available in queue");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to claim analysis from queue");
            }
        }
    }
}

/// Process one claimed analysis: download the document, run extraction,
/// rank suggestion candidates, and record the terminal state. Failed
/// attempts are requeued with backoff until `max_retries` is exhausted.
#[tracing::instrument(skip(context, config, analysis), fields(analysis.id = %analysis.id, document.id = %analysis.document_id))]
pub async fn process_one(
    context: &AnalysisContext,
    config: &AnalysisQueueConfig,
    analysis: AnalysisResult,
) -> Result<()> {
    let timeout = Duration::from_secs(config.job_timeout_seconds.max(1) as u64);

    let outcome = tokio::time::timeout(timeout, run_extraction(context, &analysis)).await;

    match outcome {
        Ok(Ok(output)) => {
            let suggested = find_suggestion(context, &analysis, &output).await;
            context
                .analyses
                .complete(analysis.id, &output.fields, &output.confidence, suggested)
                .await
                .context("Failed to record completed analysis")?;
            tracing::info!(
                suggested_contract = ?suggested,
                "Analysis completed"
            );
            Ok(())
        }
        Ok(Err(e)) => record_failure(context, config, &analysis, &e.to_string()).await,
        Err(_) => {
            let message = format!("Extraction timed out after {}s", timeout.as_secs());
            record_failure(context, config, &analysis, &message).await
        }
    }
}

async fn run_extraction(
    context: &AnalysisContext,
    analysis: &AnalysisResult,
) -> Result<ExtractionOutput> {
    let document = context
        .documents
        .get_by_id(analysis.tenant_id, analysis.document_id)
        .await?
        .context("Document for analysis no longer exists")?;

    let data = context
        .storage
        .download(document.storage_key())
        .await
        .context("Failed to download document from storage")?;

    context
        .provider
        .extract(&document.original_filename, &document.content_type, &data)
        .await
}

async fn find_suggestion(
    context: &AnalysisContext,
    analysis: &AnalysisResult,
    output: &ExtractionOutput,
) -> Option<uuid::Uuid> {
    if output.fields.counterparty_name.is_none() && output.fields.contract_number.is_none() {
        return None;
    }

    // Candidate narrowing uses the first significant token of the extracted
    // counterparty so "Acme Corporation" still finds "Acme Corp" rows.
    let counterparty_token = output
        .fields
        .counterparty_name
        .as_deref()
        .and_then(|name| name.split_whitespace().next());

    match context
        .contracts
        .find_candidates(
            analysis.tenant_id,
            counterparty_token,
            output.fields.contract_number.as_deref(),
            SUGGESTION_CANDIDATE_LIMIT,
        )
        .await
    {
        Ok(candidates) => best_suggestion(&output.fields, &candidates),
        Err(e) => {
            // Suggestion is best-effort; never fail the analysis over it
            tracing::warn!(error = %e, "Suggested-contract candidate query failed");
            None
        }
    }
}

async fn record_failure(
    context: &AnalysisContext,
    config: &AnalysisQueueConfig,
    analysis: &AnalysisResult,
    message: &str,
) -> Result<()> {
    if analysis.retry_count < config.max_retries {
        let backoff = compute_retry_backoff_seconds(analysis.retry_count);
        tracing::warn!(
            error = %message,
            retry_count = analysis.retry_count,
            backoff_secs = backoff,
            "Analysis attempt failed, requeueing"
        );
        context
            .analyses
            .requeue(analysis.id, message, backoff)
            .await
            .context("Failed to requeue analysis")?;
    } else {
        tracing::error!(
            error = %message,
            retry_count = analysis.retry_count,
            "Analysis failed terminally"
        );
        context
            .analyses
            .fail(analysis.id, message)
            .await
            .context("Failed to record failed analysis")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_exponential_with_cap() {
        assert_eq!(compute_retry_backoff_seconds(0), 1);
        assert_eq!(compute_retry_backoff_seconds(1), 2);
        assert_eq!(compute_retry_backoff_seconds(3), 8);
        assert_eq!(compute_retry_backoff_seconds(8), 256);
        assert_eq!(compute_retry_backoff_seconds(9), MAX_RETRY_BACKOFF_SECS);
        assert_eq!(compute_retry_backoff_seconds(20), MAX_RETRY_BACKOFF_SECS);
    }

    #[test]
    fn test_default_config() {
        let config = AnalysisQueueConfig::default();
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.max_retries, 3);
    }
}
