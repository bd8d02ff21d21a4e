pub mod memory;
pub mod sample;

use async_trait::async_trait;
use uuid::Uuid;

use shared_models::{
    AppointmentRecord, AvailabilitySlot, ConsumeOutcome, Doctor, IntakeError, PatientRecord,
    Specialty,
};

pub use memory::MemoryStore;

/// Storage collaborator contract for the intake core: read-only clinic
/// reference data, atomic slot consumption, and read/write patient and
/// appointment records keyed by conversation session.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn specialties(&self) -> Result<Vec<Specialty>, IntakeError>;

    async fn specialty(&self, id: Uuid) -> Result<Option<Specialty>, IntakeError>;

    async fn doctors_in_specialty(&self, specialty_id: Uuid) -> Result<Vec<Doctor>, IntakeError>;

    async fn doctor(&self, id: Uuid) -> Result<Option<Doctor>, IntakeError>;

    /// Unconsumed slots for one doctor, ordered by start time.
    async fn unconsumed_slots(&self, doctor_id: Uuid) -> Result<Vec<AvailabilitySlot>, IntakeError>;

    /// Atomic compare-and-set on the slot's consumed flag. Two concurrent
    /// bookings of the same slot see exactly one `Consumed`.
    async fn try_consume_slot(&self, slot_id: Uuid) -> Result<ConsumeOutcome, IntakeError>;

    async fn upsert_patient(&self, record: PatientRecord) -> Result<(), IntakeError>;

    async fn patient_for_session(&self, session_id: Uuid) -> Result<Option<PatientRecord>, IntakeError>;

    /// Store the session's current appointment request. One record per
    /// session: restarting after a cancel replaces the cancelled record,
    /// so callers needing a cancellation trail must keep their own.
    async fn upsert_appointment(&self, record: AppointmentRecord) -> Result<(), IntakeError>;

    async fn appointment_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<AppointmentRecord>, IntakeError>;
}
