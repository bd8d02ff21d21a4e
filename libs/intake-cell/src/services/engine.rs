use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use booking_cell::{BookingMachine, BookingProgress, BookingService, BookingState};
use doctor_cell::AvailabilityService;
use patient_cell::{extract_updates, FieldUpdate, PatientField, RegistrationMachine, RegistrationState};
use shared_config::AppConfig;
use shared_models::{AppointmentRecord, AppointmentStatus, IntakeError, PatientRecord};
use shared_store::ClinicStore;
use shared_utils::{format_display, DateTimeParser};
use specialty_cell::SpecialtyMatcher;

use crate::models::{IntakeReply, SessionSnapshot};
use crate::services::summary::IntakeSummary;

/// Per-conversation state. Events for one session are handled under its
/// mutex, so each is processed to completion before the next.
struct Session {
    registration: RegistrationMachine,
    booking: BookingMachine,
    patient: Option<PatientRecord>,
    appointment_id: Uuid,
    appointment_created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            registration: RegistrationMachine::new(),
            booking: BookingMachine::new(),
            patient: None,
            appointment_id: Uuid::new_v4(),
            appointment_created_at: Utc::now(),
        }
    }
}

/// Front door of the intake core: one operation per conversational intent.
/// Reference data is loaded once into immutable matcher indexes at
/// construction; `refresh` rebuilds them after the catalog changes.
pub struct IntakeEngine {
    config: AppConfig,
    store: Arc<dyn ClinicStore>,
    matcher: RwLock<Arc<SpecialtyMatcher>>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl IntakeEngine {
    pub async fn new(config: AppConfig, store: Arc<dyn ClinicStore>) -> anyhow::Result<Self> {
        let specialties = store
            .specialties()
            .await
            .context("loading specialty reference data")?;
        info!("intake engine loaded {} specialties", specialties.len());
        let matcher = Arc::new(SpecialtyMatcher::new(&config, specialties));
        Ok(Self {
            config,
            store,
            matcher: RwLock::new(matcher),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Rebuild the matcher indexes from the store. In-flight sessions keep
    /// the index they started their current event with.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let specialties = self
            .store
            .specialties()
            .await
            .context("reloading specialty reference data")?;
        info!("refreshing matcher indexes ({} specialties)", specialties.len());
        *self.matcher.write().await = Arc::new(SpecialtyMatcher::new(&self.config, specialties));
        Ok(())
    }

    // ===== Registration intents =====

    pub async fn register_field_update(
        &self,
        session_id: Uuid,
        update: FieldUpdate,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        match session.registration.apply_update(update, Utc::now().date_naive()) {
            Ok(_) => Ok(IntakeReply::Success(snapshot(session_id, &session))),
            Err(err) => recover(err),
        }
    }

    /// Mine a free-form utterance for field values, applying whatever was
    /// recognized. Supports out-of-order intake.
    pub async fn register_utterance(
        &self,
        session_id: Uuid,
        utterance: &str,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let updates = extract_updates(utterance);
        if updates.is_empty() {
            return Ok(IntakeReply::Clarification {
                reason: "no registration details were recognized".to_string(),
                options: field_names(&session.registration.missing_required()),
            });
        }

        let today = Utc::now().date_naive();
        let mut applied = 0;
        let mut first_failure = None;
        for update in updates {
            match session.registration.apply_update(update, today) {
                Ok(_) => applied += 1,
                Err(IntakeError::Validation(reason))
                | Err(IntakeError::InvalidTransition(reason)) => {
                    first_failure.get_or_insert(reason);
                }
                Err(err) => return Err(err),
            }
        }
        debug!("utterance applied {} field updates", applied);

        if applied == 0 {
            let reason = first_failure.unwrap_or_else(|| "nothing could be applied".to_string());
            return Ok(IntakeReply::Rejected { reason });
        }
        Ok(IntakeReply::Success(snapshot(session_id, &session)))
    }

    /// Patient accepts or disputes the read-back summary. Acceptance
    /// persists the patient record.
    pub async fn confirm_registration(
        &self,
        session_id: Uuid,
        accepted: bool,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        match session.registration.confirm(accepted) {
            Ok(RegistrationState::Confirmed) => {
                let mut record = session.registration.record(session_id)?;
                if let Some(existing) = &session.patient {
                    record.id = existing.id;
                    record.created_at = existing.created_at;
                }
                self.store.upsert_patient(record.clone()).await?;
                info!("patient record {} persisted", record.id);
                session.patient = Some(record);
                Ok(IntakeReply::Success(snapshot(session_id, &session)))
            }
            Ok(_) => Ok(IntakeReply::Success(snapshot(session_id, &session))),
            Err(err) => recover(err),
        }
    }

    /// Clear a disputed field and return to collecting.
    pub async fn correct_field(
        &self,
        session_id: Uuid,
        field: PatientField,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        match session.registration.request_correction(field) {
            Ok(_) => Ok(IntakeReply::Success(snapshot(session_id, &session))),
            Err(err) => recover(err),
        }
    }

    /// Post-confirmation amendment of exactly one field; the stored
    /// patient record is updated in place.
    pub async fn update_confirmed_field(
        &self,
        session_id: Uuid,
        update: FieldUpdate,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        if let Err(err) = session
            .registration
            .amend_confirmed(update, Utc::now().date_naive())
        {
            return recover(err);
        }

        let mut record = session.registration.record(session_id)?;
        if let Some(existing) = &session.patient {
            record.id = existing.id;
            record.created_at = existing.created_at;
        }
        self.store.upsert_patient(record.clone()).await?;
        session.patient = Some(record);
        Ok(IntakeReply::Success(snapshot(session_id, &session)))
    }

    // ===== Booking intents =====

    /// Enter booking once registration is confirmed. A cancelled booking
    /// may be restarted with a fresh draft.
    pub async fn start_booking(&self, session_id: Uuid) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        if session.registration.state() != RegistrationState::Confirmed {
            return Ok(IntakeReply::Rejected {
                reason: "registration must be confirmed before booking".to_string(),
            });
        }
        if session.booking.state() == BookingState::Cancelled {
            session.booking = BookingMachine::new();
            session.appointment_id = Uuid::new_v4();
            session.appointment_created_at = Utc::now();
        }

        let complaint = session
            .patient
            .as_ref()
            .map(|p| p.chief_complaint.clone())
            .unwrap_or_default();

        let service = self.booking_service().await;
        let result = service.start(&mut session.booking, &complaint).await;
        self.finish_booking_event(session_id, &mut session, result).await
    }

    pub async fn select_specialty(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let service = self.booking_service().await;
        let result = service.select_specialty(&mut session.booking, text).await;
        self.finish_booking_event(session_id, &mut session, result).await
    }

    pub async fn select_doctor(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let service = self.booking_service().await;
        let result = service.select_doctor(&mut session.booking, text).await;
        self.finish_booking_event(session_id, &mut session, result).await
    }

    pub async fn select_time(
        &self,
        session_id: Uuid,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let service = self.booking_service().await;
        let result = service.select_time(&mut session.booking, text, now).await;
        self.finish_booking_event(session_id, &mut session, result).await
    }

    /// Book one of the previously offered alternative slots.
    pub async fn confirm_booking(
        &self,
        session_id: Uuid,
        slot_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let service = self.booking_service().await;
        let result = service.confirm_slot(&mut session.booking, slot_id, now).await;
        self.finish_booking_event(session_id, &mut session, result).await
    }

    pub async fn cancel_booking(&self, session_id: Uuid) -> Result<IntakeReply, IntakeError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        let service = self.booking_service().await;
        let result = service.cancel(&mut session.booking);
        self.finish_booking_event(session_id, &mut session, result).await
    }

    // ===== Summary =====

    /// End-of-call summary of everything captured for this session.
    pub async fn summary(&self, session_id: Uuid) -> IntakeSummary {
        let session = self.session(session_id).await;
        let session = session.lock().await;

        IntakeSummary::assemble(
            &self.config,
            session.registration.draft(),
            &session.registration.missing_required(),
            session.booking.draft(),
            session.booking.state(),
        )
    }

    // ===== Session lifecycle =====

    /// Drop a finished or abandoned conversation's in-memory state.
    /// Persisted patient and appointment records are untouched; a later
    /// event for the same id starts a fresh session. Returns whether the
    /// session existed.
    pub async fn end_session(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            info!("session {} ended", session_id);
        }
        removed
    }

    // ===== Internals =====

    async fn session(&self, session_id: Uuid) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&session_id) {
            return session.clone();
        }
        self.sessions
            .write()
            .await
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Collaborators are rebuilt per event from the current matcher index,
    /// so a refresh takes effect on the next event.
    async fn booking_service(&self) -> BookingService {
        let matcher = self.matcher.read().await.clone();
        BookingService::new(
            self.store.clone(),
            matcher,
            AvailabilityService::new(&self.config, self.store.clone()),
            DateTimeParser::new(&self.config),
        )
    }

    /// Translate a booking outcome into a reply and persist the
    /// appointment record for every state change.
    async fn finish_booking_event(
        &self,
        session_id: Uuid,
        session: &mut Session,
        result: Result<BookingProgress, IntakeError>,
    ) -> Result<IntakeReply, IntakeError> {
        let progress = match result {
            Ok(progress) => progress,
            Err(err) => return recover(err),
        };
        self.persist_appointment(session_id, session).await?;

        Ok(match progress {
            BookingProgress::SpecialtySuggested { suggestion } => IntakeReply::Clarification {
                reason: format!(
                    "based on the complaint, {} looks appropriate; confirm or name another specialty",
                    suggestion.specialty.name
                ),
                options: vec![suggestion.specialty.name],
            },
            BookingProgress::SpecialtyChoiceNeeded { options } => IntakeReply::Clarification {
                reason: "please choose a specialty".to_string(),
                options,
            },
            BookingProgress::DoctorChoiceNeeded { candidates } => IntakeReply::Clarification {
                reason: "please pick a doctor, or say \"any doctor\"".to_string(),
                options: candidates.into_iter().map(|d| d.name).collect(),
            },
            BookingProgress::AlternativesOffered { slots } => IntakeReply::Clarification {
                reason: "the requested time is not open; the nearest openings are listed"
                    .to_string(),
                options: slots
                    .iter()
                    .map(|s| format_display(s.start_time))
                    .collect(),
            },
            BookingProgress::SpecialtySelected { .. }
            | BookingProgress::DoctorSelected { .. }
            | BookingProgress::Scheduled { .. }
            | BookingProgress::PendingMatch { .. }
            | BookingProgress::Cancelled => IntakeReply::Success(snapshot(session_id, session)),
        })
    }

    async fn persist_appointment(
        &self,
        session_id: Uuid,
        session: &Session,
    ) -> Result<(), IntakeError> {
        let patient_id = match &session.patient {
            Some(patient) => patient.id,
            // Booking cannot have started without a persisted patient.
            None => return Ok(()),
        };
        let draft = session.booking.draft();
        let record = AppointmentRecord {
            id: session.appointment_id,
            session_id,
            patient_id,
            specialty_id: draft.specialty_id,
            doctor_id: draft.doctor_id,
            slot_id: draft.slot_id,
            scheduled_time: draft.scheduled_time,
            requested_time_text: draft.requested_time_text.clone(),
            duration_minutes: self.config.default_duration_minutes,
            status: appointment_status(session.booking.state()),
            created_at: session.appointment_created_at,
            updated_at: Utc::now(),
        };
        self.store.upsert_appointment(record).await
    }
}

/// Validation and transition faults become conversational rejections;
/// anything else is a real fault for the caller.
fn recover(err: IntakeError) -> Result<IntakeReply, IntakeError> {
    match err {
        IntakeError::Validation(reason) | IntakeError::InvalidTransition(reason) => {
            Ok(IntakeReply::Rejected { reason })
        }
        other => Err(other),
    }
}

fn snapshot(session_id: Uuid, session: &Session) -> SessionSnapshot {
    SessionSnapshot {
        session_id,
        registration_state: session.registration.state(),
        patient: session.registration.draft().clone(),
        missing_fields: session.registration.missing_required(),
        booking_state: session.booking.state(),
        appointment: session.booking.draft().clone(),
    }
}

fn field_names(fields: &[PatientField]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn appointment_status(state: BookingState) -> AppointmentStatus {
    match state {
        BookingState::PendingMatch => AppointmentStatus::PendingMatch,
        BookingState::Confirmed => AppointmentStatus::Confirmed,
        BookingState::Cancelled => AppointmentStatus::Cancelled,
        _ => AppointmentStatus::Collecting,
    }
}
