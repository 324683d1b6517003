//! Wizard state controller: the three-step Details, Obligations, Review
//! flow over a contract draft.
//!
//! The controller is a client-side state machine. Forward transitions are
//! linear; backward navigation to any visited step loses nothing, and edits
//! made after going back overwrite the draft in place. Persistence happens
//! at the Details boundary (create-or-update) and at final Review
//! submission (update + obligation replace + primary attachment); moving
//! between Obligations and Review is purely local.
//!
//! Each persistence method holds `&mut self` across its await, so a second
//! submission cannot start while one is outstanding - the "advance disabled
//! while a call is in flight" rule is enforced by the borrow checker rather
//! than a flag.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::ClientError;
use crate::store::ContractStore;
use pacta_core::models::{
    AttachDocumentRequest, ContractResponse, CreateContractRequest, DocumentRole, ExtractedFields,
    ObligationInput, PrefillResponse, UpdateContractRequest,
};
use pacta_core::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Details,
    Obligations,
    Review,
}

/// Draft fields a user can edit on the Details step. Tracked individually so
/// late-arriving extracted data never overwrites user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DraftField {
    ContractType,
    ContractNumber,
    CounterpartyName,
    CounterpartyAddress,
    CounterpartyEmail,
    EffectiveDate,
    ExpiryDate,
    ExecutionDate,
    RenewalDate,
    Value,
    Currency,
}

/// The in-progress contract: Details-step fields plus the obligation list
/// attached on the Obligations step.
#[derive(Debug, Clone, Default)]
pub struct ContractDraft {
    pub contract_type: String,
    pub contract_number: Option<String>,
    pub counterparty_name: String,
    pub counterparty_address: Option<String>,
    pub counterparty_email: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub obligations: Vec<ObligationInput>,
}

impl ContractDraft {
    fn as_create_request(&self) -> CreateContractRequest {
        CreateContractRequest {
            contract_type: self.contract_type.clone(),
            counterparty_name: self.counterparty_name.clone(),
            contract_number: self.contract_number.clone(),
            status: None,
            counterparty_address: self.counterparty_address.clone(),
            counterparty_email: self.counterparty_email.clone(),
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            execution_date: self.execution_date,
            renewal_date: self.renewal_date,
            value: self.value,
            currency: self.currency.clone(),
        }
    }

    fn as_update_request(&self) -> UpdateContractRequest {
        UpdateContractRequest {
            contract_type: Some(self.contract_type.clone()),
            contract_number: self.contract_number.clone(),
            status: None,
            counterparty_name: Some(self.counterparty_name.clone()),
            counterparty_address: self.counterparty_address.clone(),
            counterparty_email: self.counterparty_email.clone(),
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            execution_date: self.execution_date,
            renewal_date: self.renewal_date,
            value: self.value,
            currency: self.currency.clone(),
        }
    }
}

/// One batch of Details-step edits. `Some` fields are applied to the draft
/// and marked as user-edited.
#[derive(Debug, Clone, Default)]
pub struct DetailsInput {
    pub contract_type: Option<String>,
    pub contract_number: Option<String>,
    pub counterparty_name: Option<String>,
    pub counterparty_address: Option<String>,
    pub counterparty_email: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Cannot {action} from the {from:?} step")]
    InvalidTransition {
        from: WizardStep,
        action: &'static str,
    },

    #[error("Persistence failed: {0}")]
    Store(ClientError),
}

impl From<ClientError> for WizardError {
    fn from(err: ClientError) -> Self {
        match err {
            // Server field errors re-attach to the originating inputs,
            // exactly like local validation failures
            ClientError::Validation {
                field_errors,
                message,
            } => {
                if field_errors.is_empty() {
                    WizardError::Validation(vec![FieldError::new("form", message)])
                } else {
                    WizardError::Validation(field_errors)
                }
            }
            other => WizardError::Store(other),
        }
    }
}

pub struct WizardController<S: ContractStore> {
    store: S,
    step: WizardStep,
    draft: ContractDraft,
    contract_id: Option<Uuid>,
    /// Set when the wizard was opened from an uploaded document; Review
    /// submission attaches it as the primary document.
    document_id: Option<Uuid>,
    edited: BTreeSet<DraftField>,
    enforce_date_order: bool,
}

impl<S: ContractStore> WizardController<S> {
    /// Open a blank wizard (plain create flow).
    pub fn new(store: S) -> Self {
        Self {
            store,
            step: WizardStep::Details,
            draft: ContractDraft::default(),
            contract_id: None,
            document_id: None,
            edited: BTreeSet::new(),
            enforce_date_order: true,
        }
    }

    pub fn with_date_order_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_date_order = enforce;
        self
    }

    /// Open the wizard seeded from a prefill snapshot (AI-assisted creation).
    pub async fn open_from_prefill(store: S, prefill_id: Uuid) -> Result<Self, WizardError> {
        let prefill: PrefillResponse = store.get_prefill(prefill_id).await?;
        let mut wizard = Self::new(store);
        wizard.document_id = Some(prefill.document_id);
        wizard.apply_prefill(&prefill.fields);
        Ok(wizard)
    }

    /// Open the wizard against an existing contract (edit mode): all three
    /// steps are seeded from the persisted record, and every persistence
    /// point uses update.
    pub async fn open_for_edit(store: S, contract_id: Uuid) -> Result<Self, WizardError> {
        let contract = store.get_contract(contract_id).await?;
        let obligations = store.list_obligations(contract_id).await?;

        let mut wizard = Self::new(store);
        wizard.contract_id = Some(contract_id);
        wizard.draft = draft_from_contract(&contract, obligations);
        Ok(wizard)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &ContractDraft {
        &self.draft
    }

    pub fn contract_id(&self) -> Option<Uuid> {
        self.contract_id
    }

    /// Apply user edits to the Details fields, marking each as edited.
    pub fn update_details(&mut self, input: DetailsInput) {
        if let Some(v) = input.contract_type {
            self.draft.contract_type = v;
            self.edited.insert(DraftField::ContractType);
        }
        if let Some(v) = input.contract_number {
            self.draft.contract_number = Some(v);
            self.edited.insert(DraftField::ContractNumber);
        }
        if let Some(v) = input.counterparty_name {
            self.draft.counterparty_name = v;
            self.edited.insert(DraftField::CounterpartyName);
        }
        if let Some(v) = input.counterparty_address {
            self.draft.counterparty_address = Some(v);
            self.edited.insert(DraftField::CounterpartyAddress);
        }
        if let Some(v) = input.counterparty_email {
            self.draft.counterparty_email = Some(v);
            self.edited.insert(DraftField::CounterpartyEmail);
        }
        if let Some(v) = input.effective_date {
            self.draft.effective_date = Some(v);
            self.edited.insert(DraftField::EffectiveDate);
        }
        if let Some(v) = input.expiry_date {
            self.draft.expiry_date = Some(v);
            self.edited.insert(DraftField::ExpiryDate);
        }
        if let Some(v) = input.execution_date {
            self.draft.execution_date = Some(v);
            self.edited.insert(DraftField::ExecutionDate);
        }
        if let Some(v) = input.renewal_date {
            self.draft.renewal_date = Some(v);
            self.edited.insert(DraftField::RenewalDate);
        }
        if let Some(v) = input.value {
            self.draft.value = Some(v);
            self.edited.insert(DraftField::Value);
        }
        if let Some(v) = input.currency {
            self.draft.currency = Some(v);
            self.edited.insert(DraftField::Currency);
        }
    }

    /// Fill draft fields from extracted data. Only fields the user has not
    /// edited are touched, so late-arriving extraction never clobbers input.
    pub fn apply_prefill(&mut self, fields: &ExtractedFields) {
        if !self.edited.contains(&DraftField::CounterpartyName) {
            if let Some(v) = &fields.counterparty_name {
                self.draft.counterparty_name = v.clone();
            }
        }
        if !self.edited.contains(&DraftField::ContractType) {
            if let Some(v) = &fields.document_type {
                self.draft.contract_type = v.clone();
            }
        }
        if !self.edited.contains(&DraftField::ContractNumber) {
            if let Some(v) = &fields.contract_number {
                self.draft.contract_number = Some(v.clone());
            }
        }
        if !self.edited.contains(&DraftField::EffectiveDate) {
            if let Some(v) = fields.effective_date {
                self.draft.effective_date = Some(v);
            }
        }
        if !self.edited.contains(&DraftField::ExpiryDate) {
            if let Some(v) = fields.termination_date {
                self.draft.expiry_date = Some(v);
            }
        }
        if !self.edited.contains(&DraftField::Value) {
            if let Some(v) = fields.contract_value {
                self.draft.value = Some(v);
            }
        }
        if !self.edited.contains(&DraftField::Currency) {
            if let Some(v) = &fields.currency {
                self.draft.currency = Some(v.clone());
            }
        }
    }

    /// Submit the Details step: validate locally, persist the draft
    /// (create on first submission, update thereafter), then advance.
    /// On failure the wizard stays on Details and the field errors map back
    /// onto the inputs.
    pub async fn submit_details(&mut self) -> Result<(), WizardError> {
        if self.step != WizardStep::Details {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                action: "submit details",
            });
        }

        let request = self.draft.as_create_request();
        let errors = request.validate(self.enforce_date_order);
        if !errors.is_empty() {
            return Err(WizardError::Validation(errors));
        }

        match self.contract_id {
            Some(id) => {
                self.store
                    .update_contract(id, &self.draft.as_update_request())
                    .await?;
            }
            None => {
                let contract = self.store.create_contract(&request).await?;
                self.contract_id = Some(contract.id);
            }
        }

        self.step = WizardStep::Obligations;
        Ok(())
    }

    /// Submit the Obligations step: validate and attach the list to the
    /// in-memory draft. Purely local - persistence happens with the final
    /// submission.
    pub fn submit_obligations(
        &mut self,
        obligations: Vec<ObligationInput>,
    ) -> Result<(), WizardError> {
        if self.step != WizardStep::Obligations {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                action: "submit obligations",
            });
        }

        let errors: Vec<FieldError> = obligations
            .iter()
            .enumerate()
            .flat_map(|(index, input)| {
                input.validate().into_iter().map(move |e| {
                    FieldError::new(format!("obligations[{}].{}", index, e.field), e.message)
                })
            })
            .collect();
        if !errors.is_empty() {
            return Err(WizardError::Validation(errors));
        }

        self.draft.obligations = obligations;
        self.step = WizardStep::Review;
        Ok(())
    }

    /// Go back one step. Pure state change; nothing is discarded.
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.step = match self.step {
            WizardStep::Details => {
                return Err(WizardError::InvalidTransition {
                    from: self.step,
                    action: "go back",
                })
            }
            WizardStep::Obligations => WizardStep::Details,
            WizardStep::Review => WizardStep::Obligations,
        };
        Ok(())
    }

    /// Final submission: persist the full draft (contract fields plus the
    /// obligation list) and attach the source document as primary when the
    /// wizard was opened from an upload. On failure the wizard remains on
    /// Review.
    pub async fn submit_review(&mut self) -> Result<ContractResponse, WizardError> {
        if self.step != WizardStep::Review {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                action: "submit review",
            });
        }

        let contract_id = self.contract_id.ok_or_else(|| {
            WizardError::Store(ClientError::Decode(
                "Review reached without a persisted Details step".to_string(),
            ))
        })?;

        let contract = self
            .store
            .update_contract(contract_id, &self.draft.as_update_request())
            .await?;
        self.store
            .replace_obligations(contract_id, &self.draft.obligations)
            .await?;

        if let Some(document_id) = self.document_id {
            let attach = AttachDocumentRequest {
                document_id,
                document_role: DocumentRole::Main,
                is_primary: true,
                notes: None,
                effective_date: self.draft.effective_date,
            };
            match self.store.attach_document(contract_id, &attach).await {
                Ok(_) => {}
                // Already attached (e.g. a retried final submission): fine
                Err(ClientError::Conflict(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(contract)
    }

    /// Discard the in-memory draft. Whatever was committed at the Details
    /// step stays persisted; nothing else is written.
    pub fn cancel(self) {}
}

fn draft_from_contract(
    contract: &ContractResponse,
    obligations: Vec<pacta_core::models::ObligationResponse>,
) -> ContractDraft {
    ContractDraft {
        contract_type: contract.contract_type.clone(),
        contract_number: contract.contract_number.clone(),
        counterparty_name: contract.counterparty_name.clone(),
        counterparty_address: contract.counterparty_address.clone(),
        counterparty_email: contract.counterparty_email.clone(),
        effective_date: contract.effective_date,
        expiry_date: contract.expiry_date,
        execution_date: contract.execution_date,
        renewal_date: contract.renewal_date,
        value: contract.value,
        currency: contract.currency.clone(),
        obligations: obligations
            .into_iter()
            .map(|o| ObligationInput {
                title: o.title,
                description: o.description,
                obligation_type: o.obligation_type,
                responsible_party: o.responsible_party,
                due_date: o.due_date,
                recurrence: o.recurrence,
                status: Some(o.status),
            })
            .collect(),
    }
}
