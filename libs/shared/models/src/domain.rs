use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CLINIC REFERENCE DATA
// ==============================================================================

/// A clinical department grouping doctors, with the alias terms used for
/// complaint-based matching. Read-only during a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty_id: Uuid,
    pub bio: Option<String>,
}

/// A single bookable interval for one doctor, consumable at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub is_consumed: bool,
}

impl AvailabilitySlot {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

/// Result of the store's compare-and-set on a slot's consumed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeOutcome {
    Consumed,
    AlreadyConsumed,
    NotFound,
}

// ==============================================================================
// PERSISTED CONVERSATION RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub address: String,
    pub chief_complaint: String,
    pub email: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_id: Option<String>,
    pub has_referral: bool,
    pub referred_physician: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Collecting,
    PendingMatch,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Collecting => write!(f, "collecting"),
            AppointmentStatus::PendingMatch => write!(f, "pending_match"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Appointment as persisted per conversation session. A pending_match record
/// keeps whatever specialty/doctor/time text was captured so operational
/// staff can follow up; nothing the patient asked for is dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub patient_id: Uuid,
    pub specialty_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub requested_time_text: Option<String>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
