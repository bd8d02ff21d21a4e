use serde::Serialize;
use uuid::Uuid;

use booking_cell::{AppointmentDraft, BookingState};
use patient_cell::{PatientDraft, PatientField, RegistrationState};

/// Point-in-time view of one conversation, returned to the dialogue layer
/// after every successful event.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub registration_state: RegistrationState,
    pub patient: PatientDraft,
    pub missing_fields: Vec<PatientField>,
    pub booking_state: BookingState,
    pub appointment: AppointmentDraft,
}

/// Discriminated result of one intake operation. `Clarification` asks the
/// dialogue layer to re-prompt with options; `Rejected` carries a reason
/// the patient can act on. Storage and programming faults surface as
/// `IntakeError` instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum IntakeReply {
    Success(SessionSnapshot),
    Clarification {
        reason: String,
        options: Vec<String>,
    },
    Rejected {
        reason: String,
    },
}
