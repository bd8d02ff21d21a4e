use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{AvailabilitySlot, Doctor, Specialty};
use specialty_cell::SpecialtyMatch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    #[default]
    NotStarted,
    SelectingSpecialty,
    SelectingDoctor,
    SelectingTime,
    /// Resolution failed but the request is preserved for manual follow-up.
    PendingMatch,
    Confirmed,
    Cancelled,
}

impl BookingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not_started",
            Self::SelectingSpecialty => "selecting_specialty",
            Self::SelectingDoctor => "selecting_doctor",
            Self::SelectingTime => "selecting_time",
            Self::PendingMatch => "pending_match",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// The appointment under construction. Captured context survives a
/// transition to pending-match so nothing the patient said is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub specialty_id: Option<Uuid>,
    pub specialty_name: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub doctor_name: Option<String>,
    pub requested_time_text: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub slot_id: Option<Uuid>,
    /// Alternatives most recently offered; a confirm-booking intent must
    /// name one of these.
    pub offered_slots: Vec<AvailabilitySlot>,
}

/// Per-session booking walk. All transition logic lives in
/// `BookingService`; this type only carries the draft and current state.
#[derive(Debug, Default)]
pub struct BookingMachine {
    pub(crate) draft: AppointmentDraft,
    pub(crate) state: BookingState,
}

impl BookingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn draft(&self) -> &AppointmentDraft {
        &self.draft
    }
}

/// What the dialogue layer should do next after a booking event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "progress", rename_all = "snake_case")]
pub enum BookingProgress {
    /// Auto-suggestion from the chief complaint; awaiting acceptance or an
    /// explicit override.
    SpecialtySuggested { suggestion: SpecialtyMatch },
    /// Nothing matched; the patient must choose from the catalog.
    SpecialtyChoiceNeeded { options: Vec<String> },
    SpecialtySelected {
        specialty: Specialty,
        doctors: Vec<Doctor>,
    },
    DoctorSelected { doctor: Doctor },
    DoctorChoiceNeeded { candidates: Vec<Doctor> },
    /// A slot was consumed and the appointment is confirmed.
    Scheduled { slot: AvailabilitySlot },
    AlternativesOffered { slots: Vec<AvailabilitySlot> },
    PendingMatch { reason: String },
    Cancelled,
}
