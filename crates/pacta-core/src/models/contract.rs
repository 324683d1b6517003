use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::FieldError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    UnderReview,
    Active,
    Expired,
    Terminated,
    Renewed,
}

impl Display for ContractStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContractStatus::Draft => write!(f, "DRAFT"),
            ContractStatus::UnderReview => write!(f, "UNDER_REVIEW"),
            ContractStatus::Active => write!(f, "ACTIVE"),
            ContractStatus::Expired => write!(f, "EXPIRED"),
            ContractStatus::Terminated => write!(f, "TERMINATED"),
            ContractStatus::Renewed => write!(f, "RENEWED"),
        }
    }
}

impl FromStr for ContractStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ContractStatus::Draft),
            "UNDER_REVIEW" => Ok(ContractStatus::UnderReview),
            "ACTIVE" => Ok(ContractStatus::Active),
            "EXPIRED" => Ok(ContractStatus::Expired),
            "TERMINATED" => Ok(ContractStatus::Terminated),
            "RENEWED" => Ok(ContractStatus::Renewed),
            _ => Err(anyhow::anyhow!("Invalid contract status: {}", s)),
        }
    }
}

/// A persisted contract record. Owns its obligations and document links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contract_type: String,
    pub contract_number: Option<String>,
    pub status: ContractStatus,
    pub counterparty_name: String,
    pub counterparty_address: Option<String>,
    pub counterparty_email: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate the date-ordering expectation: expiry must not precede effective.
/// Returns the offending field error when enforcement is on and both dates
/// are present out of order.
pub fn validate_date_order(
    effective_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
) -> Option<FieldError> {
    match (effective_date, expiry_date) {
        (Some(effective), Some(expiry)) if expiry < effective => Some(FieldError::new(
            "expiry_date",
            "Expiry date must not precede effective date",
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateContractRequest {
    pub contract_type: String,
    pub counterparty_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CreateContractRequest {
    /// Field-level validation applied at the API boundary and mirrored by the
    /// wizard's local Details-step check.
    pub fn validate(&self, enforce_date_order: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.counterparty_name.trim().is_empty() {
            errors.push(FieldError::new(
                "counterparty_name",
                "Counterparty name is required",
            ));
        }
        if self.contract_type.trim().is_empty() {
            errors.push(FieldError::new("contract_type", "Contract type is required"));
        }
        if let Some(email) = &self.counterparty_email {
            if !email.trim().is_empty() && !email.contains('@') {
                errors.push(FieldError::new(
                    "counterparty_email",
                    "Counterparty email is not a valid address",
                ));
            }
        }
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                errors.push(FieldError::new(
                    "currency",
                    "Currency must be a 3-letter ISO code",
                ));
            }
        }
        if enforce_date_order {
            if let Some(err) = validate_date_order(self.effective_date, self.expiry_date) {
                errors.push(err);
            }
        }
        errors
    }
}

/// PATCH payload: every field optional, absent fields left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateContractRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl UpdateContractRequest {
    pub fn is_empty(&self) -> bool {
        self.contract_type.is_none()
            && self.contract_number.is_none()
            && self.status.is_none()
            && self.counterparty_name.is_none()
            && self.counterparty_address.is_none()
            && self.counterparty_email.is_none()
            && self.effective_date.is_none()
            && self.expiry_date.is_none()
            && self.execution_date.is_none()
            && self.renewal_date.is_none()
            && self.value.is_none()
            && self.currency.is_none()
    }
}

impl Contract {
    /// Merge a PATCH payload into this contract (in memory), then validate
    /// the merged result before persisting.
    pub fn apply_update(&mut self, update: &UpdateContractRequest) {
        if let Some(v) = &update.contract_type {
            self.contract_type = v.clone();
        }
        if let Some(v) = &update.contract_number {
            self.contract_number = Some(v.clone());
        }
        if let Some(v) = update.status {
            self.status = v;
        }
        if let Some(v) = &update.counterparty_name {
            self.counterparty_name = v.clone();
        }
        if let Some(v) = &update.counterparty_address {
            self.counterparty_address = Some(v.clone());
        }
        if let Some(v) = &update.counterparty_email {
            self.counterparty_email = Some(v.clone());
        }
        if let Some(v) = update.effective_date {
            self.effective_date = Some(v);
        }
        if let Some(v) = update.expiry_date {
            self.expiry_date = Some(v);
        }
        if let Some(v) = update.execution_date {
            self.execution_date = Some(v);
        }
        if let Some(v) = update.renewal_date {
            self.renewal_date = Some(v);
        }
        if let Some(v) = update.value {
            self.value = Some(v);
        }
        if let Some(v) = &update.currency {
            self.currency = Some(v.clone());
        }
    }

    /// Validate the (merged) record the same way a create payload is validated.
    pub fn validate(&self, enforce_date_order: bool) -> Vec<FieldError> {
        let request = CreateContractRequest {
            contract_type: self.contract_type.clone(),
            counterparty_name: self.counterparty_name.clone(),
            contract_number: self.contract_number.clone(),
            status: Some(self.status),
            counterparty_address: self.counterparty_address.clone(),
            counterparty_email: self.counterparty_email.clone(),
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            execution_date: self.execution_date,
            renewal_date: self.renewal_date,
            value: self.value,
            currency: self.currency.clone(),
        };
        request.validate(enforce_date_order)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContractResponse {
    pub id: Uuid,
    pub contract_type: String,
    pub contract_number: Option<String>,
    pub status: ContractStatus,
    pub counterparty_name: String,
    pub counterparty_address: Option<String>,
    pub counterparty_email: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contract> for ContractResponse {
    fn from(contract: Contract) -> Self {
        ContractResponse {
            id: contract.id,
            contract_type: contract.contract_type,
            contract_number: contract.contract_number,
            status: contract.status,
            counterparty_name: contract.counterparty_name,
            counterparty_address: contract.counterparty_address,
            counterparty_email: contract.counterparty_email,
            effective_date: contract.effective_date,
            expiry_date: contract.expiry_date,
            execution_date: contract.execution_date,
            renewal_date: contract.renewal_date,
            value: contract.value,
            currency: contract.currency,
            created_at: contract.created_at,
            updated_at: contract.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateContractRequest {
        CreateContractRequest {
            contract_type: "service_agreement".to_string(),
            counterparty_name: "Acme Corp".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_request().validate(true).is_empty());
    }

    #[test]
    fn test_validate_requires_counterparty_name() {
        let mut request = valid_request();
        request.counterparty_name = "   ".to_string();
        let errors = request.validate(true);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "counterparty_name");
    }

    #[test]
    fn test_validate_requires_contract_type() {
        let mut request = valid_request();
        request.contract_type = String::new();
        let errors = request.validate(true);
        assert_eq!(errors[0].field, "contract_type");
    }

    #[test]
    fn test_validate_rejects_inverted_dates_when_enforced() {
        let mut request = valid_request();
        request.effective_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        request.expiry_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let errors = request.validate(true);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "expiry_date");
        // Advisory mode: same payload passes
        assert!(request.validate(false).is_empty());
    }

    #[test]
    fn test_validate_accepts_equal_dates() {
        let mut request = valid_request();
        request.effective_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        request.expiry_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(request.validate(true).is_empty());
    }

    #[test]
    fn test_validate_currency_code() {
        let mut request = valid_request();
        request.currency = Some("EURO".to_string());
        assert_eq!(request.validate(true)[0].field, "currency");
        request.currency = Some("EUR".to_string());
        assert!(request.validate(true).is_empty());
    }

    #[test]
    fn test_apply_update_merges_only_present_fields() {
        let mut contract = Contract {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            contract_type: "service_agreement".to_string(),
            contract_number: Some("SA-001".to_string()),
            status: ContractStatus::Draft,
            counterparty_name: "Acme Corp".to_string(),
            counterparty_address: None,
            counterparty_email: None,
            effective_date: None,
            expiry_date: None,
            execution_date: None,
            renewal_date: None,
            value: None,
            currency: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let update = UpdateContractRequest {
            status: Some(ContractStatus::Active),
            counterparty_email: Some("legal@acme.example".to_string()),
            ..Default::default()
        };
        contract.apply_update(&update);

        assert_eq!(contract.status, ContractStatus::Active);
        assert_eq!(
            contract.counterparty_email.as_deref(),
            Some("legal@acme.example")
        );
        // Untouched fields survive
        assert_eq!(contract.counterparty_name, "Acme Corp");
        assert_eq!(contract.contract_number.as_deref(), Some("SA-001"));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ContractStatus::Draft,
            ContractStatus::UnderReview,
            ContractStatus::Active,
            ContractStatus::Expired,
            ContractStatus::Terminated,
            ContractStatus::Renewed,
        ] {
            assert_eq!(status.to_string().parse::<ContractStatus>().unwrap(), status);
        }
    }
}
