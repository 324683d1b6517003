//! Extraction provider abstraction
//!
//! This module provides the abstraction layer for extraction providers,
//! keeping provider implementations separate from the worker that drives
//! them.

use anyhow::Result;
use async_trait::async_trait;
use pacta_core::models::{ConfidenceMap, ExtractedFields};

/// Output of one extraction run: the structured fields the provider found
/// and a per-field confidence score in [0, 1].
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    pub fields: ExtractedFields,
    pub confidence: ConfidenceMap,
}

/// A provider that turns raw document bytes into structured contract fields.
///
/// Providers receive only the document content; persistence, retries, and
/// suggested-contract matching are the worker's responsibility.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<ExtractionOutput>;
}
