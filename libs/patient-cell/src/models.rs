use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every field the registration machine knows about. Corrections and the
/// missing-field report address fields through this enum, so an unknown
/// field name cannot exist at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientField {
    Name,
    DateOfBirth,
    InsuranceProvider,
    InsuranceId,
    HasReferral,
    ReferredPhysician,
    ChiefComplaint,
    Address,
    Phone,
    Email,
}

impl fmt::Display for PatientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::DateOfBirth => "date of birth",
            Self::InsuranceProvider => "insurance provider",
            Self::InsuranceId => "insurance ID",
            Self::HasReferral => "referral status",
            Self::ReferredPhysician => "referring physician",
            Self::ChiefComplaint => "reason for visit",
            Self::Address => "address",
            Self::Phone => "phone number",
            Self::Email => "email address",
        };
        f.write_str(label)
    }
}

/// One typed field update. The date of birth arrives as the spoken text
/// and is parsed during apply; a referral answer carries the physician
/// name when one was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldUpdate {
    Name(String),
    DateOfBirth(String),
    InsuranceProvider(String),
    InsuranceId(String),
    Referral {
        has_referral: bool,
        referred_physician: Option<String>,
    },
    ChiefComplaint(String),
    Address(String),
    Phone(String),
    Email(String),
}

impl FieldUpdate {
    pub fn field(&self) -> PatientField {
        match self {
            Self::Name(_) => PatientField::Name,
            Self::DateOfBirth(_) => PatientField::DateOfBirth,
            Self::InsuranceProvider(_) => PatientField::InsuranceProvider,
            Self::InsuranceId(_) => PatientField::InsuranceId,
            Self::Referral { .. } => PatientField::HasReferral,
            Self::ChiefComplaint(_) => PatientField::ChiefComplaint,
            Self::Address(_) => PatientField::Address,
            Self::Phone(_) => PatientField::Phone,
            Self::Email(_) => PatientField::Email,
        }
    }
}

/// The patient record under construction. Everything is optional until
/// validated; `has_referral` is tri-state with `None` meaning the
/// referral question has not been answered yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
    pub has_referral: Option<bool>,
    pub referred_physician: Option<String>,
    pub chief_complaint: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    #[default]
    Collecting,
    AwaitingConfirmation,
    Confirmed,
}
