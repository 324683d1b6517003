use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::FieldError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObligationType {
    Reporting,
    Payment,
    Disclosure,
    Compliance,
    Operational,
    Other,
}

impl Display for ObligationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ObligationType::Reporting => write!(f, "reporting"),
            ObligationType::Payment => write!(f, "payment"),
            ObligationType::Disclosure => write!(f, "disclosure"),
            ObligationType::Compliance => write!(f, "compliance"),
            ObligationType::Operational => write!(f, "operational"),
            ObligationType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ObligationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reporting" => Ok(ObligationType::Reporting),
            "payment" => Ok(ObligationType::Payment),
            "disclosure" => Ok(ObligationType::Disclosure),
            "compliance" => Ok(ObligationType::Compliance),
            "operational" => Ok(ObligationType::Operational),
            "other" => Ok(ObligationType::Other),
            _ => Err(anyhow::anyhow!("Invalid obligation type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
    Cancelled,
}

impl Display for ObligationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ObligationStatus::Pending => write!(f, "PENDING"),
            ObligationStatus::InProgress => write!(f, "IN_PROGRESS"),
            ObligationStatus::Completed => write!(f, "COMPLETED"),
            ObligationStatus::Overdue => write!(f, "OVERDUE"),
            ObligationStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for ObligationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ObligationStatus::Pending),
            "IN_PROGRESS" => Ok(ObligationStatus::InProgress),
            "COMPLETED" => Ok(ObligationStatus::Completed),
            "OVERDUE" => Ok(ObligationStatus::Overdue),
            "CANCELLED" => Ok(ObligationStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid obligation status: {}", s)),
        }
    }
}

/// Fixed recurrence vocabulary for recurring obligations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Display for RecurrencePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecurrencePattern::Weekly => write!(f, "weekly"),
            RecurrencePattern::Monthly => write!(f, "monthly"),
            RecurrencePattern::Quarterly => write!(f, "quarterly"),
            RecurrencePattern::SemiAnnual => write!(f, "semi_annual"),
            RecurrencePattern::Annual => write!(f, "annual"),
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "quarterly" => Ok(RecurrencePattern::Quarterly),
            "semi_annual" => Ok(RecurrencePattern::SemiAnnual),
            "annual" => Ok(RecurrencePattern::Annual),
            _ => Err(anyhow::anyhow!("Invalid recurrence pattern: {}", s)),
        }
    }
}

/// An obligation owned by exactly one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub obligation_type: ObligationType,
    pub responsible_party: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<RecurrencePattern>,
    pub status: ObligationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for an obligation. The typed `due_date` and
/// `recurrence` fields make the §3 invariants (valid calendar date, fixed
/// recurrence vocabulary) unrepresentable-if-invalid at the parse boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObligationInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub obligation_type: ObligationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ObligationStatus>,
}

impl ObligationInput {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Obligation title is required"));
        }
        errors
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObligationResponse {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub obligation_type: ObligationType,
    pub responsible_party: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<RecurrencePattern>,
    pub status: ObligationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Obligation> for ObligationResponse {
    fn from(obligation: Obligation) -> Self {
        ObligationResponse {
            id: obligation.id,
            contract_id: obligation.contract_id,
            title: obligation.title,
            description: obligation.description,
            obligation_type: obligation.obligation_type,
            responsible_party: obligation.responsible_party,
            due_date: obligation.due_date,
            recurrence: obligation.recurrence,
            status: obligation.status,
            created_at: obligation.created_at,
            updated_at: obligation.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obligation_input_requires_title() {
        let input = ObligationInput {
            title: "  ".to_string(),
            description: None,
            obligation_type: ObligationType::Payment,
            responsible_party: None,
            due_date: None,
            recurrence: None,
            status: None,
        };
        assert_eq!(input.validate()[0].field, "title");
    }

    #[test]
    fn test_recurrence_rejects_unknown_values() {
        assert!("fortnightly".parse::<RecurrencePattern>().is_err());
        assert_eq!(
            "quarterly".parse::<RecurrencePattern>().unwrap(),
            RecurrencePattern::Quarterly
        );
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ObligationStatus::Pending,
            ObligationStatus::InProgress,
            ObligationStatus::Completed,
            ObligationStatus::Overdue,
            ObligationStatus::Cancelled,
        ] {
            assert_eq!(
                status.to_string().parse::<ObligationStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_due_date_is_a_calendar_date() {
        // 2024-02-30 is not a valid calendar date; the typed field cannot hold it.
        let parsed: Result<ObligationInput, _> = serde_json::from_str(
            r#"{"title":"File report","obligation_type":"reporting","due_date":"2024-02-30"}"#,
        );
        assert!(parsed.is_err());
    }
}
