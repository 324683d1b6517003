//! Analysis poller: request extraction for an uploaded document and poll
//! the status endpoint on a fixed interval until a terminal state appears
//! or the maximum wait elapses (surfaced as a client-side timeout).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::ClientError;
use crate::{api_prefix, ApiClient};
use pacta_core::models::{AnalysisResponse, Envelope};

/// The two analysis endpoints, behind a trait so the polling discipline can
/// be exercised against scripted sequences in tests.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn request_analysis(&self, document_id: Uuid) -> Result<AnalysisResponse, ClientError>;
    async fn get_analysis(&self, analysis_id: Uuid) -> Result<AnalysisResponse, ClientError>;
}

/// Shape of the analyze endpoint response (`{ success, analysis, status }`).
#[derive(Debug, Deserialize)]
struct AnalyzeResponseBody {
    analysis: AnalysisResponse,
}

#[async_trait]
impl AnalysisApi for ApiClient {
    async fn request_analysis(&self, document_id: Uuid) -> Result<AnalysisResponse, ClientError> {
        let body: AnalyzeResponseBody = self
            .post_empty(&format!(
                "{}/contracts/upload/analyze/{}",
                api_prefix(),
                document_id
            ))
            .await?;
        Ok(body.analysis)
    }

    async fn get_analysis(&self, analysis_id: Uuid) -> Result<AnalysisResponse, ClientError> {
        let envelope: Envelope<AnalysisResponse> = self
            .get(
                &format!("{}/contracts/upload/analysis/{}", api_prefix(), analysis_id),
                &[],
            )
            .await?;
        Ok(envelope.data)
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(120),
        }
    }
}

pub struct AnalysisPoller<A: AnalysisApi> {
    api: A,
    config: PollConfig,
}

impl<A: AnalysisApi> AnalysisPoller<A> {
    pub fn new(api: A) -> Self {
        Self::with_config(api, PollConfig::default())
    }

    pub fn with_config(api: A, config: PollConfig) -> Self {
        Self { api, config }
    }

    /// Submit a document for extraction. Returns the (possibly already
    /// running) analysis immediately; the extraction runs out-of-band.
    pub async fn request_analysis(
        &self,
        document_id: Uuid,
    ) -> Result<AnalysisResponse, ClientError> {
        self.api.request_analysis(document_id).await
    }

    /// Poll on a fixed interval until the analysis reaches a terminal
    /// status, or fail with `Timeout` once the maximum wait has elapsed.
    pub async fn wait_for_terminal(
        &self,
        analysis_id: Uuid,
    ) -> Result<AnalysisResponse, ClientError> {
        let deadline = Instant::now() + self.config.max_wait;

        loop {
            let analysis = self.api.get_analysis(analysis_id).await?;
            if analysis.status.is_terminal() {
                return Ok(analysis);
            }

            if Instant::now() + self.config.interval > deadline {
                return Err(ClientError::Timeout(format!(
                    "Analysis {} did not finish within {}s",
                    analysis_id,
                    self.config.max_wait.as_secs()
                )));
            }
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Request analysis and wait for its terminal state in one call.
    pub async fn analyze_and_wait(
        &self,
        document_id: Uuid,
    ) -> Result<AnalysisResponse, ClientError> {
        let analysis = self.request_analysis(document_id).await?;
        if analysis.status.is_terminal() {
            return Ok(analysis);
        }
        self.wait_for_terminal(analysis.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pacta_core::models::{AnalysisStatus, ConfidenceMap, ExtractedFields};
    use std::sync::Mutex;

    fn response(status: AnalysisStatus, fields: ExtractedFields) -> AnalysisResponse {
        AnalysisResponse {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            status,
            fields,
            confidence: ConfidenceMap::new(),
            suggested_contract_id: None,
            error_message: None,
            requested_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Scripted API: each get_analysis call pops the next response.
    struct ScriptedApi {
        responses: Mutex<Vec<AnalysisResponse>>,
    }

    impl ScriptedApi {
        fn new(mut responses: Vec<AnalysisResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl AnalysisApi for ScriptedApi {
        async fn request_analysis(
            &self,
            _document_id: Uuid,
        ) -> Result<AnalysisResponse, ClientError> {
            Ok(response(AnalysisStatus::Pending, ExtractedFields::default()))
        }

        async fn get_analysis(&self, _analysis_id: Uuid) -> Result<AnalysisResponse, ClientError> {
            let mut responses = self.responses.lock().unwrap();
            responses
                .pop()
                .ok_or_else(|| ClientError::NotFound("script exhausted".to_string()))
        }
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_polls_until_completed() {
        let completed = ExtractedFields {
            counterparty_name: Some("Acme Corp".to_string()),
            ..Default::default()
        };
        let api = ScriptedApi::new(vec![
            response(AnalysisStatus::Pending, ExtractedFields::default()),
            response(AnalysisStatus::Processing, ExtractedFields::default()),
            response(AnalysisStatus::Completed, completed),
        ]);
        let poller = AnalysisPoller::with_config(api, fast_config());

        let result = poller
            .wait_for_terminal(Uuid::new_v4())
            .await
            .expect("terminal");
        assert_eq!(result.status, AnalysisStatus::Completed);
        assert_eq!(result.fields.counterparty_name.as_deref(), Some("Acme Corp"));
    }

    #[tokio::test]
    async fn test_pending_responses_never_carry_fields() {
        let api = ScriptedApi::new(vec![
            response(AnalysisStatus::Pending, ExtractedFields::default()),
            response(AnalysisStatus::Completed, ExtractedFields::default()),
        ]);
        // While non-terminal, only id and status are meaningful
        let first = api.get_analysis(Uuid::new_v4()).await.expect("pending");
        assert_eq!(first.status, AnalysisStatus::Pending);
        assert!(first.fields.is_empty());
    }

    #[tokio::test]
    async fn test_failed_is_terminal() {
        let mut failed = response(AnalysisStatus::Failed, ExtractedFields::default());
        failed.error_message = Some("provider unavailable".to_string());
        let api = ScriptedApi::new(vec![failed]);
        let poller = AnalysisPoller::with_config(api, fast_config());

        let result = poller
            .wait_for_terminal(Uuid::new_v4())
            .await
            .expect("terminal");
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert!(result.error_message.is_some());
    }

    #[tokio::test]
    async fn test_times_out_when_never_terminal() {
        // More pending responses than the max wait allows polls
        let api = ScriptedApi::new(
            (0..64)
                .map(|_| response(AnalysisStatus::Processing, ExtractedFields::default()))
                .collect(),
        );
        let poller = AnalysisPoller::with_config(api, fast_config());

        let err = poller
            .wait_for_terminal(Uuid::new_v4())
            .await
            .expect_err("must time out");
        assert!(matches!(err, ClientError::Timeout(_)));
    }
}
