use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Status of an AI extraction run. Terminal once `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl Display for AnalysisStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AnalysisStatus::Pending => write!(f, "PENDING"),
            AnalysisStatus::Processing => write!(f, "PROCESSING"),
            AnalysisStatus::Completed => write!(f, "COMPLETED"),
            AnalysisStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AnalysisStatus::Pending),
            "PROCESSING" => Ok(AnalysisStatus::Processing),
            "COMPLETED" => Ok(AnalysisStatus::Completed),
            "FAILED" => Ok(AnalysisStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid analysis status: {}", s)),
        }
    }
}

/// Structured fields pulled out of a contract document by the extraction provider.
/// Every field is optional: the provider fills what it can find.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.counterparty_name.is_none()
            && self.contract_title.is_none()
            && self.document_type.is_none()
            && self.effective_date.is_none()
            && self.termination_date.is_none()
            && self.contract_number.is_none()
            && self.contract_value.is_none()
            && self.currency.is_none()
    }
}

/// Per-field extraction confidence in [0, 1], keyed by field name.
pub type ConfidenceMap = BTreeMap<String, f64>;

/// Display bucket for a confidence score. Display-only: confidence never
/// blocks acceptance of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl Display for ConfidenceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Bucketing thresholds for confidence display. The thresholds are a
/// configurable policy (PACTA_CONFIDENCE_HIGH / PACTA_CONFIDENCE_MEDIUM),
/// not constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    pub high: f64,
    pub medium: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.6,
        }
    }
}

impl ConfidencePolicy {
    /// Bucket a score: High (> high), Medium (> medium), Low otherwise.
    pub fn bucket(&self, score: f64) -> ConfidenceLevel {
        if score > self.high {
            ConfidenceLevel::High
        } else if score > self.medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Human-readable summary of a confidence map, used as the point-in-time
/// audit note when attaching an analyzed document to an existing contract.
pub fn confidence_summary(confidence: &ConfidenceMap, policy: ConfidencePolicy) -> String {
    if confidence.is_empty() {
        return "No extraction confidence recorded".to_string();
    }
    let parts: Vec<String> = confidence
        .iter()
        .map(|(field, score)| format!("{}: {:.2} ({})", field, score, policy.bucket(*score)))
        .collect();
    format!("Extraction confidence at attachment: {}", parts.join(", "))
}

/// One AI analysis run for a document. Created by the analyze endpoint in
/// `Pending` state; mutated only by the analysis worker afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub status: AnalysisStatus,
    pub fields: ExtractedFields,
    pub confidence: ConfidenceMap,
    pub suggested_contract_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub requested_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub status: AnalysisStatus,
    pub fields: ExtractedFields,
    pub confidence: ConfidenceMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_contract_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(analysis: AnalysisResult) -> Self {
        AnalysisResponse {
            id: analysis.id,
            document_id: analysis.document_id,
            status: analysis.status,
            fields: analysis.fields,
            confidence: analysis.confidence,
            suggested_contract_id: analysis.suggested_contract_id,
            error_message: analysis.error_message,
            requested_at: analysis.requested_at,
            completed_at: analysis.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries_are_exclusive() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.bucket(0.86), ConfidenceLevel::High);
        assert_eq!(policy.bucket(0.85), ConfidenceLevel::Medium);
        assert_eq!(policy.bucket(0.61), ConfidenceLevel::Medium);
        assert_eq!(policy.bucket(0.6), ConfidenceLevel::Low);
        assert_eq!(policy.bucket(0.0), ConfidenceLevel::Low);
        assert_eq!(policy.bucket(1.0), ConfidenceLevel::High);
    }

    #[test]
    fn test_bucket_respects_configured_thresholds() {
        let policy = ConfidencePolicy {
            high: 0.9,
            medium: 0.7,
        };
        assert_eq!(policy.bucket(0.86), ConfidenceLevel::Medium);
        assert_eq!(policy.bucket(0.65), ConfidenceLevel::Low);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(!AnalysisStatus::Processing.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AnalysisStatus::Pending,
            AnalysisStatus::Processing,
            AnalysisStatus::Completed,
            AnalysisStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<AnalysisStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_confidence_summary() {
        let mut confidence = ConfidenceMap::new();
        confidence.insert("counterparty_name".to_string(), 0.92);
        confidence.insert("effective_date".to_string(), 0.71);
        let summary = confidence_summary(&confidence, ConfidencePolicy::default());
        assert!(summary.contains("counterparty_name: 0.92 (High)"));
        assert!(summary.contains("effective_date: 0.71 (Medium)"));
    }

    #[test]
    fn test_confidence_summary_empty() {
        let summary = confidence_summary(&ConfidenceMap::new(), ConfidencePolicy::default());
        assert_eq!(summary, "No extraction confidence recorded");
    }

    #[test]
    fn test_extracted_fields_is_empty() {
        assert!(ExtractedFields::default().is_empty());
        let fields = ExtractedFields {
            counterparty_name: Some("Acme Corp".to_string()),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }
}
