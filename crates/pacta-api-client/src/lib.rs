//! HTTP client for the Pacta API.
//!
//! Provides a minimal client with configurable auth (Bearer token or
//! X-API-Key), typed GET/POST/PATCH helpers, and the pieces of the
//! upload/analysis/wizard pipeline: [`upload::UploadService`],
//! [`poller::AnalysisPoller`], [`disposition::DispositionResolver`], and
//! [`wizard::WizardController`].

pub mod disposition;
pub mod error;
pub mod poller;
pub mod store;
pub mod upload;
pub mod wizard;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use error::{classify_response, ErrorBody};
use pacta_core::models::Envelope;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// API version prefix (e.g. "/api/v1"). Set PACTA_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version = std::env::var("PACTA_API_VERSION").unwrap_or_else(|_| "v1".to_string());
    format!("/api/{}", version)
}

/// HTTP client for the Pacta API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment: PACTA_API_URL (or API_URL), PACTA_API_KEY (or API_KEY).
    /// Uses X-API-Key auth by default.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("PACTA_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:4000".to_string());

        let api_key = std::env::var("PACTA_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| {
                ClientError::Auth("Missing API key. Set PACTA_API_KEY or API_KEY".to_string())
            })?;

        Self::new(base_url, Auth::XApiKey(api_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// Classify a non-2xx response and decode a 2xx body.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            return Err(classify_response(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);
        request = self.apply_auth(request);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).json(body);
        let request = self.apply_auth(request);

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// POST with an empty body and deserialize response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url));

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.client.patch(&url).json(body);
        let request = self.apply_auth(request);

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.client.put(&url).json(body);
        let request = self.apply_auth(request);

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// GET an enveloped resource and unwrap `data`.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let envelope: Envelope<T> = self.get(path, query).await?;
        Ok(envelope.data)
    }

    /// Raw client for custom requests (e.g. the upload transport). Caller
    /// must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

// Re-export the pipeline types for convenience.
pub use disposition::{ContractChoice, DispositionResolver};
pub use error::ClientError;
pub use poller::{AnalysisApi, AnalysisPoller, PollConfig};
pub use store::ContractStore;
pub use upload::{
    FilePayload, UploadConfig, UploadHandle, UploadMetadata, UploadProgress, UploadService,
    UploadStage,
};
pub use wizard::{ContractDraft, DetailsInput, WizardController, WizardError, WizardStep};
