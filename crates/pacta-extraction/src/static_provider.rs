//! Static extraction provider: returns a fixed output without calling any
//! external service. Used in tests and local development
//! (PACTA_EXTRACTION_PROVIDER=static).

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::provider::{ExtractionOutput, ExtractionProvider};
use pacta_core::models::ExtractedFields;

#[derive(Debug, Clone)]
pub struct StaticExtraction {
    output: ExtractionOutput,
}

impl StaticExtraction {
    pub fn new(output: ExtractionOutput) -> Self {
        Self { output }
    }

    /// Canned output for local development and integration tests.
    pub fn with_defaults() -> Self {
        let mut confidence = BTreeMap::new();
        confidence.insert("counterparty_name".to_string(), 0.92);
        confidence.insert("contract_title".to_string(), 0.88);
        confidence.insert("effective_date".to_string(), 0.9);
        confidence.insert("termination_date".to_string(), 0.64);

        Self::new(ExtractionOutput {
            fields: ExtractedFields {
                counterparty_name: Some("Acme Corp".to_string()),
                contract_title: Some("Master Services Agreement".to_string()),
                document_type: Some("service_agreement".to_string()),
                effective_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                termination_date: NaiveDate::from_ymd_opt(2025, 12, 31),
                contract_number: None,
                contract_value: None,
                currency: None,
            },
            confidence,
        })
    }
}

#[async_trait]
impl ExtractionProvider for StaticExtraction {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn extract(
        &self,
        _filename: &str,
        _content_type: &str,
        _data: &[u8],
    ) -> Result<ExtractionOutput> {
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_configured_output() {
        let provider = StaticExtraction::with_defaults();
        let output = provider
            .extract("MSA.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .expect("extract");
        assert_eq!(output.fields.counterparty_name.as_deref(), Some("Acme Corp"));
        assert_eq!(
            output.fields.effective_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(output.confidence["counterparty_name"] > 0.9);
    }
}
