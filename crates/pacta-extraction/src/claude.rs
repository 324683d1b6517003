//! Claude extraction provider: structured contract-field extraction using
//! Anthropic's Messages API with document content blocks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::provider::{ExtractionOutput, ExtractionProvider};
use pacta_core::models::ExtractedFields;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Claude extraction provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeExtractionConfig {
    /// Anthropic API key
    pub api_key: String,
    /// Claude model to use (default: claude-sonnet-4-20250514)
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

/// Claude extraction provider implementation
pub struct ClaudeExtraction {
    config: ClaudeExtractionConfig,
    http_client: reqwest::Client,
}

impl Debug for ClaudeExtraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClaudeExtraction")
            .field("model", &self.config.model)
            .finish()
    }
}

// Messages API request/response structures
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Document { source: DocumentSource },
}

#[derive(Debug, Serialize)]
struct DocumentSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockResponse {
    Text { text: String },
}

/// Loosely-typed shape of the JSON Claude returns; converted into
/// `ExtractedFields` with lenient date/number parsing.
#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    counterparty_name: Option<String>,
    contract_title: Option<String>,
    document_type: Option<String>,
    effective_date: Option<String>,
    termination_date: Option<String>,
    contract_number: Option<String>,
    contract_value: Option<serde_json::Value>,
    currency: Option<String>,
    #[serde(default)]
    confidence: BTreeMap<String, f64>,
}

impl ClaudeExtraction {
    pub fn new(config: ClaudeExtractionConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.api_key.len() < 10 {
            anyhow::bail!("Claude extraction API key appears to be invalid or a placeholder");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client for Claude extraction")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build the extraction prompt. The response contract is a flat JSON
    /// object with the field keys plus a confidence map.
    fn build_extraction_prompt() -> String {
        [
            "Extract the following fields from this contract document and respond with a single JSON object:",
            "- counterparty_name: the other party to the contract (not the document owner)",
            "- contract_title: the title of the contract",
            "- document_type: the kind of document (e.g. service_agreement, nda, purchase_order)",
            "- effective_date: the effective date in YYYY-MM-DD format",
            "- termination_date: the termination or expiry date in YYYY-MM-DD format",
            "- contract_number: the contract reference number",
            "- contract_value: the total monetary value as a number",
            "- currency: the 3-letter ISO currency code for contract_value",
            "- confidence: an object mapping each extracted field name to your confidence in it as a number between 0 and 1",
            "",
            "Omit any field you cannot find (do not guess). Respond with valid JSON only.",
        ]
        .join("\n")
    }

    /// Call Claude Messages API with the document content
    async fn analyze_document(&self, content_type: &str, data: &[u8]) -> Result<String> {
        use base64::Engine;

        let content = if content_type.starts_with("text/") {
            vec![
                ContentBlock::Text {
                    text: String::from_utf8_lossy(data).into_owned(),
                },
                ContentBlock::Text {
                    text: Self::build_extraction_prompt(),
                },
            ]
        } else {
            let base64_document = base64::engine::general_purpose::STANDARD.encode(data);
            vec![
                ContentBlock::Document {
                    source: DocumentSource {
                        source_type: "base64".to_string(),
                        media_type: content_type.to_string(),
                        data: base64_document,
                    },
                },
                ContentBlock::Text {
                    text: Self::build_extraction_prompt(),
                },
            ]
        };

        let body = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/messages", API_BASE))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Claude extraction API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Claude extraction API request failed: {} - {}",
                status,
                error_text
            ));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse Claude extraction API response")?;

        let text = parsed
            .content
            .into_iter()
            .map(|b| match b {
                ContentBlockResponse::Text { text } => text,
            })
            .next()
            .unwrap_or_default();

        Ok(text)
    }

    /// Parse Claude's JSON response into an extraction output
    fn parse_extraction(text: &str) -> Result<ExtractionOutput> {
        // Try to extract JSON from markdown code blocks if present
        let json_text = if text.contains("```json") {
            text.split("```json")
                .nth(1)
                .and_then(|s| s.split("```").next())
                .unwrap_or(text)
                .trim()
        } else if text.contains("```") {
            text.split("```")
                .nth(1)
                .and_then(|s| s.split("```").next())
                .unwrap_or(text)
                .trim()
        } else {
            text.trim()
        };

        let raw: RawExtraction = serde_json::from_str(json_text)
            .context("Failed to parse Claude extraction result as JSON")?;

        let fields = ExtractedFields {
            counterparty_name: non_empty(raw.counterparty_name),
            contract_title: non_empty(raw.contract_title),
            document_type: non_empty(raw.document_type),
            effective_date: raw.effective_date.as_deref().and_then(parse_date),
            termination_date: raw.termination_date.as_deref().and_then(parse_date),
            contract_number: non_empty(raw.contract_number),
            contract_value: raw.contract_value.as_ref().and_then(parse_decimal),
            currency: non_empty(raw.currency).map(|c| c.to_uppercase()),
        };

        let confidence = raw
            .confidence
            .into_iter()
            .map(|(field, score)| (field, score.clamp(0.0, 1.0)))
            .collect();

        Ok(ExtractionOutput { fields, confidence })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[async_trait]
impl ExtractionProvider for ClaudeExtraction {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn extract(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<ExtractionOutput> {
        tracing::info!(
            filename = %filename,
            content_type = %content_type,
            size_bytes = data.len(),
            model = %self.config.model,
            "Running Claude contract extraction"
        );

        let text = self.analyze_document(content_type, data).await?;
        Self::parse_extraction(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extraction_plain_json() {
        let output = ClaudeExtraction::parse_extraction(
            r#"{
                "counterparty_name": "Acme Corp",
                "contract_title": "Master Services Agreement",
                "effective_date": "2024-01-01",
                "contract_value": 120000.50,
                "currency": "usd",
                "confidence": {"counterparty_name": 0.92, "effective_date": 0.88}
            }"#,
        )
        .expect("parse");

        assert_eq!(output.fields.counterparty_name.as_deref(), Some("Acme Corp"));
        assert_eq!(
            output.fields.effective_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            output.fields.contract_value,
            Some(Decimal::from_str("120000.50").unwrap())
        );
        assert_eq!(output.fields.currency.as_deref(), Some("USD"));
        assert_eq!(output.confidence["counterparty_name"], 0.92);
    }

    #[test]
    fn test_parse_extraction_fenced_json() {
        let output = ClaudeExtraction::parse_extraction(
            "Here is the extraction:\n```json\n{\"counterparty_name\": \"Globex\"}\n```",
        )
        .expect("parse");
        assert_eq!(output.fields.counterparty_name.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_parse_extraction_ignores_bad_dates_and_empty_strings() {
        let output = ClaudeExtraction::parse_extraction(
            r#"{"counterparty_name": "  ", "effective_date": "January 1st 2024"}"#,
        )
        .expect("parse");
        assert!(output.fields.counterparty_name.is_none());
        assert!(output.fields.effective_date.is_none());
    }

    #[test]
    fn test_parse_extraction_clamps_confidence() {
        let output = ClaudeExtraction::parse_extraction(
            r#"{"counterparty_name": "Acme", "confidence": {"counterparty_name": 1.7}}"#,
        )
        .expect("parse");
        assert_eq!(output.confidence["counterparty_name"], 1.0);
    }

    #[test]
    fn test_parse_extraction_rejects_non_json() {
        assert!(ClaudeExtraction::parse_extraction("I could not read the document").is_err());
    }

    #[test]
    fn test_new_rejects_placeholder_key() {
        let config = ClaudeExtractionConfig {
            api_key: "sk-ant-".to_string(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        };
        assert!(ClaudeExtraction::new(config).is_err());
    }
}
