//! Upload transport: move a selected file plus form metadata to the server
//! with user-visible progress, a cancellation token, a bounded per-attempt
//! timeout, and exactly one fallback attempt.
//!
//! The primary transport streams the multipart body and reports byte-level
//! progress; the fallback is a single buffered POST with coarse progress.
//! Both attempts share the same cancellation token: cancelling aborts
//! whichever transport is in flight and resets the stage to `Idle`.

use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::{api_prefix, ApiClient};
use pacta_core::models::{DocumentResponse, Envelope};
use pacta_core::FieldError;

/// Size ceiling applied before any network call is made.
pub const DEFAULT_MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// Granularity of progress reporting on the streaming path.
const PROGRESS_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub stage: UploadStage,
    pub percent: u8,
}

impl UploadProgress {
    fn idle() -> Self {
        Self {
            stage: UploadStage::Idle,
            percent: 0,
        }
    }
}

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Form metadata accompanying the upload. Tags are the raw comma-delimited
/// string; the server splits them.
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub tags: String,
    pub is_confidential: bool,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    /// Bounded wait per attempt; exceeding it abandons the attempt and
    /// (for the primary) triggers the fallback.
    pub attempt_timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            attempt_timeout: Duration::from_secs(120),
        }
    }
}

/// A running upload: progress stream, cancellation, and the result.
pub struct UploadHandle {
    progress: watch::Receiver<UploadProgress>,
    cancel: CancellationToken,
    join: JoinHandle<Result<DocumentResponse, ClientError>>,
}

impl UploadHandle {
    /// Subscribe to progress updates.
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    /// Abort the in-flight transport (primary or fallback) immediately.
    /// The stage resets to `Idle` and progress clears.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Await the upload outcome.
    pub async fn wait(self) -> Result<DocumentResponse, ClientError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(ClientError::Network(format!("Upload task failed: {}", e))),
        }
    }
}

#[derive(Clone)]
pub struct UploadService {
    client: ApiClient,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(client: ApiClient) -> Self {
        Self::with_config(client, UploadConfig::default())
    }

    pub fn with_config(client: ApiClient, config: UploadConfig) -> Self {
        Self { client, config }
    }

    /// Reject empty files and files over the ceiling before a byte leaves
    /// the machine.
    pub fn validate_file(&self, file: &FilePayload) -> Result<(), ClientError> {
        if file.data.is_empty() {
            return Err(ClientError::Validation {
                message: "File is empty".to_string(),
                field_errors: vec![FieldError::new("file", "File is empty")],
            });
        }
        if file.data.len() > self.config.max_file_size {
            let message = format!(
                "File is too large: {} bytes (max {} bytes)",
                file.data.len(),
                self.config.max_file_size
            );
            return Err(ClientError::Validation {
                field_errors: vec![FieldError::new("file", message.clone())],
                message,
            });
        }
        Ok(())
    }

    /// Start an upload. Validation failures surface immediately, before any
    /// request is issued.
    pub fn start(
        &self,
        file: FilePayload,
        metadata: UploadMetadata,
    ) -> Result<UploadHandle, ClientError> {
        self.validate_file(&file)?;

        let (tx, rx) = watch::channel(UploadProgress::idle());
        let cancel = CancellationToken::new();

        let client = self.client.clone();
        let config = self.config.clone();
        let task_cancel = cancel.clone();
        let task_tx = tx.clone();

        let join = tokio::spawn(async move {
            let result =
                run_upload(&client, &config, &file, &metadata, &task_tx, &task_cancel).await;
            match &result {
                Ok(document) => {
                    tracing::info!(document_id = %document.id, "Upload complete");
                    let _ = task_tx.send(UploadProgress {
                        stage: UploadStage::Complete,
                        percent: 100,
                    });
                }
                Err(ClientError::Cancelled) => {
                    let _ = task_tx.send(UploadProgress::idle());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Upload failed on both transports");
                    // Progress stays where the transfer died; never forced to 100
                    let percent = task_tx.borrow().percent;
                    let _ = task_tx.send(UploadProgress {
                        stage: UploadStage::Error,
                        percent,
                    });
                }
            }
            result
        });

        Ok(UploadHandle {
            progress: rx,
            cancel,
            join,
        })
    }
}

/// Primary attempt, then exactly one fallback attempt. Cancellation aborts
/// whichever attempt is in flight.
async fn run_upload(
    client: &ApiClient,
    config: &UploadConfig,
    file: &FilePayload,
    metadata: &UploadMetadata,
    progress: &watch::Sender<UploadProgress>,
    cancel: &CancellationToken,
) -> Result<DocumentResponse, ClientError> {
    let _ = progress.send(UploadProgress {
        stage: UploadStage::Uploading,
        percent: 0,
    });

    let primary = attempt_streaming(client, file, metadata, progress);
    let primary_err = match bounded(primary, config.attempt_timeout, cancel).await {
        Ok(document) => return Ok(document),
        Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
        Err(e) => e,
    };

    tracing::warn!(
        error = %primary_err,
        "Primary upload transport failed, retrying once with fallback"
    );
    let _ = progress.send(UploadProgress {
        stage: UploadStage::Uploading,
        percent: 0,
    });

    let fallback = attempt_buffered(client, file, metadata, progress);
    bounded(fallback, config.attempt_timeout, cancel).await
}

/// Race an attempt against cancellation and the per-attempt timeout.
async fn bounded<F>(
    attempt: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<DocumentResponse, ClientError>
where
    F: std::future::Future<Output = Result<DocumentResponse, ClientError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        outcome = tokio::time::timeout(timeout, attempt) => match outcome {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "Upload attempt exceeded {}s",
                timeout.as_secs()
            ))),
        },
    }
}

/// Streaming transport: wraps the file bytes in a chunked stream that
/// reports integer-percent progress as the body is consumed. On reaching
/// 100% the stage flips to `Processing` while the server finishes ingestion.
async fn attempt_streaming(
    client: &ApiClient,
    file: &FilePayload,
    metadata: &UploadMetadata,
    progress: &watch::Sender<UploadProgress>,
) -> Result<DocumentResponse, ClientError> {
    let total = file.data.len();
    let data = file.data.clone();
    let sent = Arc::new(AtomicUsize::new(0));
    let tx = progress.clone();

    let chunks: Vec<Bytes> = (0..total)
        .step_by(PROGRESS_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + PROGRESS_CHUNK_SIZE).min(total)))
        .collect();

    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len(), Ordering::Relaxed) + chunk.len();
        let percent = ((done as u64 * 100) / total as u64) as u8;
        let stage = if done >= total {
            UploadStage::Processing
        } else {
            UploadStage::Uploading
        };
        let _ = tx.send(UploadProgress { stage, percent });
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    let part = reqwest::multipart::Part::stream_with_length(
        reqwest::Body::wrap_stream(stream),
        total as u64,
    )
    .file_name(file.filename.clone())
    .mime_str(&file.content_type)
    .map_err(|e| ClientError::Validation {
        message: format!("Invalid content type: {}", e),
        field_errors: vec![FieldError::new("file", "Invalid content type")],
    })?;

    let form = metadata_form(metadata).part("file", part);
    send_form(client, form).await
}

/// Fallback transport: one buffered multipart POST with coarse progress.
async fn attempt_buffered(
    client: &ApiClient,
    file: &FilePayload,
    metadata: &UploadMetadata,
    progress: &watch::Sender<UploadProgress>,
) -> Result<DocumentResponse, ClientError> {
    let part = reqwest::multipart::Part::bytes(file.data.to_vec())
        .file_name(file.filename.clone())
        .mime_str(&file.content_type)
        .map_err(|e| ClientError::Validation {
            message: format!("Invalid content type: {}", e),
            field_errors: vec![FieldError::new("file", "Invalid content type")],
        })?;

    let form = metadata_form(metadata).part("file", part);
    let document = send_form(client, form).await?;

    let _ = progress.send(UploadProgress {
        stage: UploadStage::Processing,
        percent: 100,
    });
    Ok(document)
}

fn metadata_form(metadata: &UploadMetadata) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new()
        .text("title", metadata.title.clone())
        .text("type", metadata.document_type.clone())
        .text("tags", metadata.tags.clone())
        .text("is_confidential", metadata.is_confidential.to_string());
    if let Some(description) = &metadata.description {
        form = form.text("description", description.clone());
    }
    form
}

async fn send_form(
    client: &ApiClient,
    form: reqwest::multipart::Form,
) -> Result<DocumentResponse, ClientError> {
    let url = client.build_url(&format!("{}/documents", api_prefix()));
    let request = client.apply_auth(client.client().post(&url)).multipart(form);

    let response = request.send().await?;
    ApiClient::handle_response::<Envelope<DocumentResponse>>(response)
        .await
        .map(|envelope| envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use tokio::io::AsyncReadExt;

    fn test_service(base_url: &str) -> UploadService {
        let client = ApiClient::new(
            base_url.to_string(),
            Auth::XApiKey("pk_live_test".to_string()),
        )
        .expect("client");
        UploadService::with_config(
            client,
            UploadConfig {
                max_file_size: DEFAULT_MAX_FILE_SIZE,
                attempt_timeout: Duration::from_secs(5),
            },
        )
    }

    fn payload(size: usize) -> FilePayload {
        FilePayload {
            filename: "contract.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: Bytes::from(vec![0u8; size]),
        }
    }

    #[tokio::test]
    async fn test_validate_rejects_oversized_file_before_any_network_call() {
        // Unroutable base URL: a network attempt would fail differently
        let service = test_service("http://127.0.0.1:1");
        let err = service
            .validate_file(&payload(DEFAULT_MAX_FILE_SIZE + 1))
            .expect_err("must reject");
        assert!(matches!(err, ClientError::Validation { .. }));
        assert_eq!(err.field_errors()[0].field, "file");

        // start() surfaces the same error without issuing a request
        let result = service.start(payload(DEFAULT_MAX_FILE_SIZE + 1), UploadMetadata::default());
        assert!(matches!(result, Err(ClientError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_file() {
        let service = test_service("http://127.0.0.1:1");
        let err = service.validate_file(&payload(0)).expect_err("must reject");
        assert!(matches!(err, ClientError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_validate_accepts_file_at_ceiling() {
        let service = test_service("http://127.0.0.1:1");
        assert!(service.validate_file(&payload(DEFAULT_MAX_FILE_SIZE)).is_ok());
    }

    #[tokio::test]
    async fn test_both_transports_exhausted_ends_in_error_stage() {
        // Closed port: both attempts fail with a connection error
        let service = test_service("http://127.0.0.1:1");
        let handle = service
            .start(payload(1024), UploadMetadata::default())
            .expect("start");
        let progress = handle.progress();

        let result = handle.wait().await;
        assert!(result.is_err());
        assert!(!matches!(result, Err(ClientError::Cancelled)));

        let last = *progress.borrow();
        assert_eq!(last.stage, UploadStage::Error);
        // Progress is not forced to 100 on failure
        assert_ne!(last.percent, 100);
    }

    #[tokio::test]
    async fn test_cancel_aborts_inflight_transport_and_resets_to_idle() {
        // A listener that accepts and then reads forever keeps the request
        // in flight until cancellation fires.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut sink = vec![0u8; 4096];
                while let Ok(n) = socket.read(&mut sink).await {
                    if n == 0 {
                        break;
                    }
                }
            }
        });

        let service = test_service(&format!("http://{}", addr));
        let handle = service
            .start(payload(512 * 1024), UploadMetadata::default())
            .expect("start");
        let progress = handle.progress();

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();

        let result = handle.wait().await;
        assert!(matches!(result, Err(ClientError::Cancelled)));

        let last = *progress.borrow();
        assert_eq!(last.stage, UploadStage::Idle);
        assert_eq!(last.percent, 0);
    }
}
