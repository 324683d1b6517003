//! Configuration module
//!
//! This module provides the application configuration, read from environment
//! variables with sensible defaults. One `Config` instance is constructed at
//! startup and shared (cloned) into the API state, the worker, and services.

use std::env;

use crate::models::analysis::ConfidencePolicy;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_DOCUMENT_SIZE_MB: usize = 20;
const ANALYSIS_POLL_INTERVAL_MS: u64 = 2000;
const ANALYSIS_MAX_WAIT_SECS: u64 = 120;
const ANALYSIS_JOB_TIMEOUT_SECS: i32 = 300;
const PREFILL_TTL_HOURS: i64 = 24;

/// Application configuration (API, worker, and client defaults).
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    // Document upload configuration
    pub max_document_size_bytes: usize,
    pub document_allowed_extensions: Vec<String>,
    pub document_allowed_content_types: Vec<String>,
    // Analysis / extraction configuration
    pub extraction_provider: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub analysis_max_workers: usize,
    pub analysis_poll_interval_ms: u64,
    pub analysis_max_retries: i32,
    pub analysis_job_timeout_seconds: i32,
    pub analysis_max_wait_seconds: u64,
    // Confidence display policy (thresholds are a policy, not a constant)
    pub confidence_policy: ConfidencePolicy,
    // Contract validation policy
    pub enforce_date_order: bool,
    // Prefill retention
    pub prefill_ttl_hours: i64,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_document_size_mb = env::var("PACTA_MAX_DOCUMENT_SIZE_MB")
            .unwrap_or_else(|_| MAX_DOCUMENT_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_DOCUMENT_SIZE_MB);

        let document_allowed_extensions = env::var("PACTA_DOCUMENT_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "pdf,doc,docx,txt".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let document_allowed_content_types = env::var("PACTA_DOCUMENT_ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                "application/pdf,application/msword,application/vnd.openxmlformats-officedocument.wordprocessingml.document,text/plain"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok())
            .unwrap_or(StorageBackend::Local);

        let confidence_policy = ConfidencePolicy {
            high: env::var("PACTA_CONFIDENCE_HIGH")
                .unwrap_or_else(|_| "0.85".to_string())
                .parse()
                .unwrap_or(0.85),
            medium: env::var("PACTA_CONFIDENCE_MEDIUM")
                .unwrap_or_else(|_| "0.6".to_string())
                .parse()
                .unwrap_or(0.6),
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("PACTA_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .map_err(|_| anyhow::anyhow!("PACTA_DATABASE_URL or DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/documents".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000/files".to_string()),
            max_document_size_bytes: max_document_size_mb * 1024 * 1024,
            document_allowed_extensions,
            document_allowed_content_types,
            extraction_provider: env::var("PACTA_EXTRACTION_PROVIDER")
                .unwrap_or_else(|_| "claude".to_string())
                .to_lowercase(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            anthropic_model: env::var("PACTA_ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            analysis_max_workers: env::var("PACTA_ANALYSIS_MAX_WORKERS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            analysis_poll_interval_ms: env::var("PACTA_ANALYSIS_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| ANALYSIS_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(ANALYSIS_POLL_INTERVAL_MS),
            analysis_max_retries: env::var("PACTA_ANALYSIS_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            analysis_job_timeout_seconds: env::var("PACTA_ANALYSIS_JOB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| ANALYSIS_JOB_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(ANALYSIS_JOB_TIMEOUT_SECS),
            analysis_max_wait_seconds: env::var("PACTA_ANALYSIS_MAX_WAIT_SECONDS")
                .unwrap_or_else(|_| ANALYSIS_MAX_WAIT_SECS.to_string())
                .parse()
                .unwrap_or(ANALYSIS_MAX_WAIT_SECS),
            confidence_policy,
            enforce_date_order: env::var("PACTA_ENFORCE_DATE_ORDER")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            prefill_ttl_hours: env::var("PACTA_PREFILL_TTL_HOURS")
                .unwrap_or_else(|_| PREFILL_TTL_HOURS.to_string())
                .parse()
                .unwrap_or(PREFILL_TTL_HOURS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_document_size_bytes == 0 {
            return Err(anyhow::anyhow!("PACTA_MAX_DOCUMENT_SIZE_MB must be > 0"));
        }
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
        }
        if self.extraction_provider == "claude" && self.anthropic_api_key.is_none() {
            return Err(anyhow::anyhow!(
                "ANTHROPIC_API_KEY must be set when PACTA_EXTRACTION_PROVIDER=claude"
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_policy.high)
            || !(0.0..=1.0).contains(&self.confidence_policy.medium)
            || self.confidence_policy.medium > self.confidence_policy.high
        {
            return Err(anyhow::anyhow!(
                "Confidence thresholds must satisfy 0 <= medium <= high <= 1"
            ));
        }
        Ok(())
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn max_document_size_bytes(&self) -> usize {
        self.max_document_size_bytes
    }

    pub fn document_allowed_extensions(&self) -> &[String] {
        &self.document_allowed_extensions
    }

    pub fn document_allowed_content_types(&self) -> &[String] {
        &self.document_allowed_content_types
    }

    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.anthropic_api_key.as_deref()
    }

    pub fn anthropic_model(&self) -> &str {
        &self.anthropic_model
    }

    pub fn confidence_policy(&self) -> ConfidencePolicy {
        self.confidence_policy
    }

    pub fn enforce_date_order(&self) -> bool {
        self.enforce_date_order
    }
}
