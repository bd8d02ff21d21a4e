use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{
    AppointmentRecord, AvailabilitySlot, ConsumeOutcome, Doctor, IntakeError, PatientRecord,
    Specialty,
};

use crate::ClinicStore;

#[derive(Default)]
struct StoreInner {
    specialties: Vec<Specialty>,
    doctors: Vec<Doctor>,
    slots: HashMap<Uuid, AvailabilitySlot>,
    patients: HashMap<Uuid, PatientRecord>,
    appointments: HashMap<Uuid, AppointmentRecord>,
}

/// In-memory `ClinicStore`. Reference data is loaded once and treated as
/// immutable; `replace_reference_data` is the explicit refresh point, after
/// which callers must rebuild any matcher indexes derived from it.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_data(
        specialties: Vec<Specialty>,
        doctors: Vec<Doctor>,
        slots: Vec<AvailabilitySlot>,
    ) -> Self {
        let inner = StoreInner {
            specialties,
            doctors,
            slots: slots.into_iter().map(|s| (s.id, s)).collect(),
            ..StoreInner::default()
        };
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub async fn replace_reference_data(
        &self,
        specialties: Vec<Specialty>,
        doctors: Vec<Doctor>,
        slots: Vec<AvailabilitySlot>,
    ) {
        let mut inner = self.inner.write().await;
        info!(
            "replacing reference data: {} specialties, {} doctors, {} slots",
            specialties.len(),
            doctors.len(),
            slots.len()
        );
        inner.specialties = specialties;
        inner.doctors = doctors;
        inner.slots = slots.into_iter().map(|s| (s.id, s)).collect();
    }
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn specialties(&self) -> Result<Vec<Specialty>, IntakeError> {
        Ok(self.inner.read().await.specialties.clone())
    }

    async fn specialty(&self, id: Uuid) -> Result<Option<Specialty>, IntakeError> {
        Ok(self
            .inner
            .read()
            .await
            .specialties
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn doctors_in_specialty(&self, specialty_id: Uuid) -> Result<Vec<Doctor>, IntakeError> {
        Ok(self
            .inner
            .read()
            .await
            .doctors
            .iter()
            .filter(|d| d.specialty_id == specialty_id)
            .cloned()
            .collect())
    }

    async fn doctor(&self, id: Uuid) -> Result<Option<Doctor>, IntakeError> {
        Ok(self.inner.read().await.doctors.iter().find(|d| d.id == id).cloned())
    }

    async fn unconsumed_slots(&self, doctor_id: Uuid) -> Result<Vec<AvailabilitySlot>, IntakeError> {
        let inner = self.inner.read().await;
        let mut slots: Vec<AvailabilitySlot> = inner
            .slots
            .values()
            .filter(|s| s.doctor_id == doctor_id && !s.is_consumed)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn try_consume_slot(&self, slot_id: Uuid) -> Result<ConsumeOutcome, IntakeError> {
        let mut inner = self.inner.write().await;
        match inner.slots.get_mut(&slot_id) {
            Some(slot) if slot.is_consumed => {
                debug!("slot {} already consumed", slot_id);
                Ok(ConsumeOutcome::AlreadyConsumed)
            }
            Some(slot) => {
                slot.is_consumed = true;
                debug!("slot {} consumed", slot_id);
                Ok(ConsumeOutcome::Consumed)
            }
            None => Ok(ConsumeOutcome::NotFound),
        }
    }

    async fn upsert_patient(&self, record: PatientRecord) -> Result<(), IntakeError> {
        self.inner.write().await.patients.insert(record.session_id, record);
        Ok(())
    }

    async fn patient_for_session(&self, session_id: Uuid) -> Result<Option<PatientRecord>, IntakeError> {
        Ok(self.inner.read().await.patients.get(&session_id).cloned())
    }

    // Keyed by session, so a restarted booking replaces the cancelled
    // record rather than accumulating history.
    async fn upsert_appointment(&self, record: AppointmentRecord) -> Result<(), IntakeError> {
        self.inner
            .write()
            .await
            .appointments
            .insert(record.session_id, record);
        Ok(())
    }

    async fn appointment_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<AppointmentRecord>, IntakeError> {
        Ok(self.inner.read().await.appointments.get(&session_id).cloned())
    }
}
