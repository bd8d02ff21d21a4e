use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{ConsumeOutcome, IntakeError};
use shared_store::ClinicStore;

use crate::models::SlotResolution;

/// Resolves a desired time against a doctor's open slots and performs
/// the atomic consumption at booking time.
pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
    max_alternatives: usize,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, store: Arc<dyn ClinicStore>) -> Self {
        Self {
            store,
            max_alternatives: config.max_slot_alternatives,
        }
    }

    /// Find the slot at exactly `desired`, or the nearest future
    /// alternatives. Consumed slots are never offered.
    pub async fn resolve(
        &self,
        doctor_id: Uuid,
        desired: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<SlotResolution, IntakeError> {
        let slots = self.store.unconsumed_slots(doctor_id).await?;

        if let Some(exact) = slots.iter().find(|s| s.start_time == desired) {
            debug!("exact slot {} found for doctor {}", exact.id, doctor_id);
            return Ok(SlotResolution::Exact(exact.clone()));
        }

        let mut future: Vec<_> = slots.into_iter().filter(|s| s.start_time > now).collect();
        if future.is_empty() {
            return Ok(SlotResolution::NoAvailability);
        }

        // Nearest to the desired time first; earlier start breaks ties.
        future.sort_by_key(|s| {
            let distance = (s.start_time - desired).abs();
            (distance, s.start_time)
        });
        future.truncate(self.max_alternatives);

        debug!(
            "offering {} alternative slots for doctor {}",
            future.len(),
            doctor_id
        );
        Ok(SlotResolution::Alternatives(future))
    }

    /// Atomically claim a slot. `AlreadyConsumed` means another session
    /// won the race and the caller should re-resolve.
    pub async fn consume(&self, slot_id: Uuid) -> Result<ConsumeOutcome, IntakeError> {
        self.store.try_consume_slot(slot_id).await
    }
}
