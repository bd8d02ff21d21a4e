use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::{AvailabilityService, DoctorMatchOutcome, DoctorMatcher, SlotResolution};
use shared_models::{AvailabilitySlot, ConsumeOutcome, Doctor, IntakeError};
use shared_store::ClinicStore;
use shared_utils::{DateTimeParser, ParsedWhen};
use specialty_cell::SpecialtyMatcher;

use crate::models::{BookingMachine, BookingProgress, BookingState};

/// Drives a `BookingMachine` through specialty, doctor, and time selection.
/// Shared across sessions; all per-conversation state lives in the machine.
pub struct BookingService {
    store: Arc<dyn ClinicStore>,
    matcher: Arc<SpecialtyMatcher>,
    availability: AvailabilityService,
    parser: DateTimeParser,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn ClinicStore>,
        matcher: Arc<SpecialtyMatcher>,
        availability: AvailabilityService,
        parser: DateTimeParser,
    ) -> Self {
        Self {
            store,
            matcher,
            availability,
            parser,
        }
    }

    /// Enter specialty selection, auto-suggesting from the chief complaint.
    pub async fn start(
        &self,
        machine: &mut BookingMachine,
        chief_complaint: &str,
    ) -> Result<BookingProgress, IntakeError> {
        if machine.state != BookingState::NotStarted {
            return Err(IntakeError::InvalidTransition(format!(
                "booking already started ({})",
                machine.state
            )));
        }
        machine.state = BookingState::SelectingSpecialty;

        match self.matcher.match_complaint(chief_complaint) {
            Some(suggestion) => {
                debug!("suggesting {} for the complaint", suggestion.specialty.name);
                Ok(BookingProgress::SpecialtySuggested { suggestion })
            }
            None => Ok(BookingProgress::SpecialtyChoiceNeeded {
                options: self.specialty_names(),
            }),
        }
    }

    /// Accept a specialty by name or by complaint-style description.
    pub async fn select_specialty(
        &self,
        machine: &mut BookingMachine,
        text: &str,
    ) -> Result<BookingProgress, IntakeError> {
        self.expect_state(machine, BookingState::SelectingSpecialty)?;

        let specialty = match self.matcher.by_name(text) {
            Some(s) => s.clone(),
            None => match self.matcher.match_complaint(text) {
                Some(m) => m.specialty,
                None => {
                    return Ok(BookingProgress::SpecialtyChoiceNeeded {
                        options: self.specialty_names(),
                    })
                }
            },
        };

        let doctors = self.store.doctors_in_specialty(specialty.id).await?;
        machine.draft.specialty_id = Some(specialty.id);
        machine.draft.specialty_name = Some(specialty.name.clone());
        machine.state = BookingState::SelectingDoctor;
        info!("specialty selected: {}", specialty.name);
        Ok(BookingProgress::SpecialtySelected { specialty, doctors })
    }

    /// Match a spoken doctor name; "any doctor" picks the first of the
    /// specialty's roster.
    pub async fn select_doctor(
        &self,
        machine: &mut BookingMachine,
        text: &str,
    ) -> Result<BookingProgress, IntakeError> {
        self.expect_state(machine, BookingState::SelectingDoctor)?;
        let specialty_id = machine.draft.specialty_id.ok_or_else(|| {
            IntakeError::InvalidTransition("no specialty selected yet".to_string())
        })?;

        let roster = self.store.doctors_in_specialty(specialty_id).await?;
        if roster.is_empty() {
            warn!("specialty {} has no doctors", specialty_id);
            return Ok(self.park(machine, "no doctors are available in this specialty"));
        }

        if wants_any_doctor(text) {
            let doctor = roster[0].clone();
            return Ok(self.accept_doctor(machine, doctor));
        }

        match DoctorMatcher::new(roster.clone()).match_name(text) {
            DoctorMatchOutcome::Matched(doctor) => Ok(self.accept_doctor(machine, doctor)),
            DoctorMatchOutcome::Ambiguous(candidates) => {
                Ok(BookingProgress::DoctorChoiceNeeded { candidates })
            }
            DoctorMatchOutcome::NoMatch => {
                Ok(BookingProgress::DoctorChoiceNeeded { candidates: roster })
            }
        }
    }

    /// Parse the requested time and resolve it against the doctor's open
    /// slots. An exact hit consumes the slot and confirms the appointment.
    pub async fn select_time(
        &self,
        machine: &mut BookingMachine,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<BookingProgress, IntakeError> {
        self.expect_state(machine, BookingState::SelectingTime)?;
        let doctor_id = machine.draft.doctor_id.ok_or_else(|| {
            IntakeError::InvalidTransition("no doctor selected yet".to_string())
        })?;
        machine.draft.requested_time_text = Some(text.to_string());

        let desired = match self.parser.parse(text, now) {
            ParsedWhen::Exact(dt) => dt,
            ParsedWhen::Ambiguous(reason) => {
                return Ok(self.park(machine, &format!("the requested time is unclear: {}", reason)));
            }
            ParsedWhen::Unparseable => {
                return Ok(self.park(machine, "the requested time could not be understood"));
            }
        };

        match self.availability.resolve(doctor_id, desired, now).await? {
            SlotResolution::Exact(slot) => self.try_book(machine, slot, desired, now).await,
            SlotResolution::Alternatives(slots) => Ok(self.offer(machine, slots)),
            SlotResolution::NoAvailability => {
                Ok(self.park(machine, "the doctor has no open appointment slots"))
            }
        }
    }

    /// Book one of the previously offered alternatives.
    pub async fn confirm_slot(
        &self,
        machine: &mut BookingMachine,
        slot_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BookingProgress, IntakeError> {
        self.expect_state(machine, BookingState::SelectingTime)?;

        let slot = machine
            .draft
            .offered_slots
            .iter()
            .find(|s| s.id == slot_id)
            .cloned()
            .ok_or_else(|| {
                IntakeError::Validation("that slot was not among the offered options".to_string())
            })?;

        let desired = slot.start_time;
        self.try_book(machine, slot, desired, now).await
    }

    /// Cancel from any non-terminal state. Not recoverable; a new booking
    /// starts over with a fresh machine.
    pub fn cancel(&self, machine: &mut BookingMachine) -> Result<BookingProgress, IntakeError> {
        if machine.state.is_terminal() {
            return Err(IntakeError::InvalidTransition(format!(
                "booking is already {}",
                machine.state
            )));
        }
        machine.state = BookingState::Cancelled;
        info!("booking cancelled");
        Ok(BookingProgress::Cancelled)
    }

    /// Consume the slot, falling back to re-resolution when another
    /// session won the race for it.
    async fn try_book(
        &self,
        machine: &mut BookingMachine,
        slot: AvailabilitySlot,
        desired: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<BookingProgress, IntakeError> {
        match self.availability.consume(slot.id).await? {
            ConsumeOutcome::Consumed => {
                machine.draft.slot_id = Some(slot.id);
                machine.draft.scheduled_time = Some(slot.start_time);
                machine.draft.offered_slots.clear();
                machine.state = BookingState::Confirmed;
                info!("slot {} booked", slot.id);
                Ok(BookingProgress::Scheduled { slot })
            }
            ConsumeOutcome::AlreadyConsumed => {
                debug!("slot {} lost to a concurrent booking, re-resolving", slot.id);
                self.reresolve(machine, desired, now).await
            }
            ConsumeOutcome::NotFound => Err(IntakeError::NotFound(format!(
                "availability slot {} does not exist",
                slot.id
            ))),
        }
    }

    /// After a slot conflict: offer whatever is still open, or park the
    /// request. The conversation never fails outright.
    async fn reresolve(
        &self,
        machine: &mut BookingMachine,
        desired: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<BookingProgress, IntakeError> {
        let doctor_id = machine.draft.doctor_id.ok_or_else(|| {
            IntakeError::InvalidTransition("no doctor selected yet".to_string())
        })?;
        match self.availability.resolve(doctor_id, desired, now).await? {
            // The desired slot was just consumed, so resolution can only
            // yield other slots; treat an exact hit as an alternative.
            SlotResolution::Exact(slot) => Ok(self.offer(machine, vec![slot])),
            SlotResolution::Alternatives(slots) => Ok(self.offer(machine, slots)),
            SlotResolution::NoAvailability => {
                Ok(self.park(machine, "the requested slot was just taken and no others are open"))
            }
        }
    }

    fn accept_doctor(&self, machine: &mut BookingMachine, doctor: Doctor) -> BookingProgress {
        machine.draft.doctor_id = Some(doctor.id);
        machine.draft.doctor_name = Some(doctor.name.clone());
        machine.state = BookingState::SelectingTime;
        info!("doctor selected: {}", doctor.name);
        BookingProgress::DoctorSelected { doctor }
    }

    fn offer(&self, machine: &mut BookingMachine, slots: Vec<AvailabilitySlot>) -> BookingProgress {
        machine.draft.offered_slots = slots.clone();
        BookingProgress::AlternativesOffered { slots }
    }

    /// Park the booking as pending-match, keeping everything captured so
    /// far for the scheduling team.
    fn park(&self, machine: &mut BookingMachine, reason: &str) -> BookingProgress {
        warn!("booking parked: {}", reason);
        machine.state = BookingState::PendingMatch;
        BookingProgress::PendingMatch {
            reason: reason.to_string(),
        }
    }

    fn expect_state(
        &self,
        machine: &BookingMachine,
        expected: BookingState,
    ) -> Result<(), IntakeError> {
        if machine.state != expected {
            return Err(IntakeError::InvalidTransition(format!(
                "expected {} but booking is {}",
                expected, machine.state
            )));
        }
        Ok(())
    }

    fn specialty_names(&self) -> Vec<String> {
        self.matcher
            .specialties()
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }
}

fn wants_any_doctor(text: &str) -> bool {
    let normalized = shared_utils::text::normalize(text);
    matches!(
        normalized.as_str(),
        "any" | "any doctor" | "anyone" | "anybody" | "no preference" | "whoever is available"
    )
}
