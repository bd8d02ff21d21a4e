use chrono::{NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_models::{IntakeError, PatientRecord};
use shared_utils::contact::{is_valid_email, normalize_phone};
use shared_utils::parse_date_of_birth;

use crate::models::{FieldUpdate, PatientDraft, PatientField, RegistrationState};

/// Fields that must be filled before a summary is offered.
const REQUIRED_FIELDS: &[PatientField] = &[
    PatientField::Name,
    PatientField::DateOfBirth,
    PatientField::ChiefComplaint,
    PatientField::Address,
    PatientField::Phone,
    PatientField::HasReferral,
];

/// Owns the patient draft through collection, confirmation, and
/// post-confirmation amendments.
#[derive(Debug, Default)]
pub struct RegistrationMachine {
    draft: PatientDraft,
    state: RegistrationState,
}

impl RegistrationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn draft(&self) -> &PatientDraft {
        &self.draft
    }

    /// Validate and apply one field update. Moves to awaiting-confirmation
    /// once nothing required is missing. Rejected once confirmed; use
    /// `amend_confirmed` for that.
    pub fn apply_update(
        &mut self,
        update: FieldUpdate,
        today: NaiveDate,
    ) -> Result<RegistrationState, IntakeError> {
        if self.state == RegistrationState::Confirmed {
            return Err(IntakeError::InvalidTransition(
                "registration is already confirmed".to_string(),
            ));
        }

        set_field(&mut self.draft, update, today)?;
        self.state = if self.missing_required().is_empty() {
            RegistrationState::AwaitingConfirmation
        } else {
            RegistrationState::Collecting
        };
        Ok(self.state)
    }

    /// Patient accepts or disputes the read-back summary.
    pub fn confirm(&mut self, accepted: bool) -> Result<RegistrationState, IntakeError> {
        if self.state != RegistrationState::AwaitingConfirmation {
            return Err(IntakeError::InvalidTransition(format!(
                "cannot confirm registration from {:?}",
                self.state
            )));
        }
        if accepted {
            self.draft.confirmed = true;
            self.state = RegistrationState::Confirmed;
            debug!("registration confirmed");
        } else {
            self.state = RegistrationState::Collecting;
        }
        Ok(self.state)
    }

    /// Clear a disputed field and return to collecting.
    pub fn request_correction(
        &mut self,
        field: PatientField,
    ) -> Result<RegistrationState, IntakeError> {
        if self.state == RegistrationState::Confirmed {
            return Err(IntakeError::InvalidTransition(
                "use a specific-field amendment after confirmation".to_string(),
            ));
        }
        self.clear_field(field);
        self.state = RegistrationState::Collecting;
        Ok(self.state)
    }

    /// Post-confirmation amendment of exactly one field. The draft stays
    /// confirmed and every other field is untouched. An amendment that
    /// would leave a required field empty is rejected, so a confirmed
    /// draft never loses completeness.
    pub fn amend_confirmed(
        &mut self,
        update: FieldUpdate,
        today: NaiveDate,
    ) -> Result<(), IntakeError> {
        if self.state != RegistrationState::Confirmed {
            return Err(IntakeError::InvalidTransition(
                "registration is not confirmed yet".to_string(),
            ));
        }
        let field = update.field();
        let mut amended = self.draft.clone();
        set_field(&mut amended, update, today)?;
        let reopened = missing_fields(&amended);
        if !reopened.is_empty() {
            let names: Vec<String> = reopened.iter().map(|f| f.to_string()).collect();
            return Err(IntakeError::Validation(format!(
                "updating {} would leave {} empty",
                field,
                names.join(", ")
            )));
        }
        debug!("amending confirmed field {}", field);
        self.draft = amended;
        Ok(())
    }

    /// Required fields still empty, including the referring physician once
    /// the patient has said they were referred.
    pub fn missing_required(&self) -> Vec<PatientField> {
        missing_fields(&self.draft)
    }

    /// Build the persistable record. Only valid once confirmed.
    pub fn record(&self, session_id: Uuid) -> Result<PatientRecord, IntakeError> {
        if self.state != RegistrationState::Confirmed {
            return Err(IntakeError::InvalidTransition(
                "registration is not confirmed yet".to_string(),
            ));
        }
        let required = |field: &Option<String>, name: &str| {
            field
                .clone()
                .ok_or_else(|| IntakeError::Validation(format!("{} is missing", name)))
        };
        let now = Utc::now();
        Ok(PatientRecord {
            id: Uuid::new_v4(),
            session_id,
            name: required(&self.draft.name, "name")?,
            date_of_birth: self
                .draft
                .date_of_birth
                .ok_or_else(|| IntakeError::Validation("date of birth is missing".to_string()))?,
            phone: required(&self.draft.phone, "phone")?,
            address: required(&self.draft.address, "address")?,
            chief_complaint: required(&self.draft.chief_complaint, "chief complaint")?,
            email: self.draft.email.clone(),
            insurance_provider: self.draft.insurance_provider.clone(),
            insurance_id: self.draft.insurance_id.clone(),
            has_referral: self.draft.has_referral.unwrap_or(false),
            referred_physician: self.draft.referred_physician.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn clear_field(&mut self, field: PatientField) {
        match field {
            PatientField::Name => self.draft.name = None,
            PatientField::DateOfBirth => self.draft.date_of_birth = None,
            PatientField::InsuranceProvider => self.draft.insurance_provider = None,
            PatientField::InsuranceId => self.draft.insurance_id = None,
            PatientField::HasReferral => {
                self.draft.has_referral = None;
                self.draft.referred_physician = None;
            }
            PatientField::ReferredPhysician => self.draft.referred_physician = None,
            PatientField::ChiefComplaint => self.draft.chief_complaint = None,
            PatientField::Address => self.draft.address = None,
            PatientField::Phone => self.draft.phone = None,
            PatientField::Email => self.draft.email = None,
        }
    }
}

fn missing_fields(draft: &PatientDraft) -> Vec<PatientField> {
    let mut missing: Vec<PatientField> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !is_filled(draft, *field))
        .collect();
    if draft.has_referral == Some(true) && draft.referred_physician.is_none() {
        missing.push(PatientField::ReferredPhysician);
    }
    missing
}

fn is_filled(draft: &PatientDraft, field: PatientField) -> bool {
    match field {
        PatientField::Name => draft.name.is_some(),
        PatientField::DateOfBirth => draft.date_of_birth.is_some(),
        PatientField::InsuranceProvider => draft.insurance_provider.is_some(),
        PatientField::InsuranceId => draft.insurance_id.is_some(),
        PatientField::HasReferral => draft.has_referral.is_some(),
        PatientField::ReferredPhysician => draft.referred_physician.is_some(),
        PatientField::ChiefComplaint => draft.chief_complaint.is_some(),
        PatientField::Address => draft.address.is_some(),
        PatientField::Phone => draft.phone.is_some(),
        PatientField::Email => draft.email.is_some(),
    }
}

fn set_field(
    draft: &mut PatientDraft,
    update: FieldUpdate,
    today: NaiveDate,
) -> Result<(), IntakeError> {
    match update {
        FieldUpdate::Name(value) => {
            draft.name = Some(non_empty(value, PatientField::Name)?);
        }
        FieldUpdate::DateOfBirth(text) => {
            let dob = parse_date_of_birth(&text, today).map_err(IntakeError::Validation)?;
            draft.date_of_birth = Some(dob);
        }
        FieldUpdate::InsuranceProvider(value) => {
            draft.insurance_provider = Some(non_empty(value, PatientField::InsuranceProvider)?);
        }
        FieldUpdate::InsuranceId(value) => {
            draft.insurance_id = Some(non_empty(value, PatientField::InsuranceId)?);
        }
        FieldUpdate::Referral {
            has_referral,
            referred_physician,
        } => {
            draft.has_referral = Some(has_referral);
            draft.referred_physician = if has_referral {
                referred_physician.filter(|p| !p.trim().is_empty())
            } else {
                None
            };
        }
        FieldUpdate::ChiefComplaint(value) => {
            draft.chief_complaint = Some(non_empty(value, PatientField::ChiefComplaint)?);
        }
        FieldUpdate::Address(value) => {
            draft.address = Some(non_empty(value, PatientField::Address)?);
        }
        FieldUpdate::Phone(value) => {
            let digits = normalize_phone(&value).map_err(IntakeError::Validation)?;
            draft.phone = Some(digits);
        }
        FieldUpdate::Email(value) => {
            let value = value.trim().to_lowercase();
            if !is_valid_email(&value) {
                return Err(IntakeError::Validation(format!(
                    "{:?} does not look like an email address",
                    value
                )));
            }
            draft.email = Some(value);
        }
    }
    Ok(())
}

fn non_empty(value: String, field: PatientField) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}
