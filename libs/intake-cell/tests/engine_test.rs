use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use booking_cell::BookingState;
use intake_cell::{IntakeEngine, IntakeReply};
use patient_cell::{FieldUpdate, PatientField, RegistrationState};
use shared_config::AppConfig;
use shared_models::{AppointmentStatus, AvailabilitySlot, Doctor, Specialty};
use shared_store::{ClinicStore, MemoryStore};

// Wednesday.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 10, 10, 0, 0).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap()
}

fn catalog() -> (Vec<Specialty>, Vec<Doctor>, Vec<AvailabilitySlot>) {
    let cardiology = Specialty {
        id: Uuid::new_v4(),
        name: "Cardiology".to_string(),
        description: "Diagnosis and treatment of heart and vascular conditions".to_string(),
        aliases: ["heart", "chest pain", "palpitations", "shortness of breath"]
            .iter()
            .map(|a| a.to_string())
            .collect(),
    };
    let jane = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Jane Smith".to_string(),
        specialty_id: cardiology.id,
        bio: None,
    };
    let john = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. John Smith".to_string(),
        specialty_id: cardiology.id,
        bio: None,
    };
    let slots = vec![
        AvailabilitySlot {
            id: Uuid::new_v4(),
            doctor_id: jane.id,
            start_time: at(16, 14),
            duration_minutes: 30,
            is_consumed: false,
        },
        AvailabilitySlot {
            id: Uuid::new_v4(),
            doctor_id: jane.id,
            start_time: at(17, 9),
            duration_minutes: 30,
            is_consumed: false,
        },
    ];
    (vec![cardiology], vec![jane, john], slots)
}

async fn engine_with_store() -> (IntakeEngine, Arc<MemoryStore>) {
    let (specialties, doctors, slots) = catalog();
    let store = Arc::new(MemoryStore::with_reference_data(specialties, doctors, slots));
    let engine = IntakeEngine::new(AppConfig::default(), store.clone())
        .await
        .unwrap();
    (engine, store)
}

async fn register(engine: &IntakeEngine, session_id: Uuid) {
    let updates = vec![
        FieldUpdate::Name("Maria Garcia".to_string()),
        FieldUpdate::DateOfBirth("03/15/1985".to_string()),
        FieldUpdate::ChiefComplaint("chest pains and shortness of breath".to_string()),
        FieldUpdate::Address("742 Evergreen Terrace, Springfield".to_string()),
        FieldUpdate::Phone("(555) 010-4433".to_string()),
        FieldUpdate::Referral {
            has_referral: false,
            referred_physician: None,
        },
    ];
    for update in updates {
        let reply = engine.register_field_update(session_id, update).await.unwrap();
        assert_matches!(reply, IntakeReply::Success(_));
    }
    let reply = engine.confirm_registration(session_id, true).await.unwrap();
    assert_matches!(
        reply,
        IntakeReply::Success(s) if s.registration_state == RegistrationState::Confirmed
    );
}

async fn walk_to_time_selection(engine: &IntakeEngine, session_id: Uuid) {
    register(engine, session_id).await;

    // The chief complaint should auto-suggest Cardiology.
    let reply = engine.start_booking(session_id).await.unwrap();
    assert_matches!(
        reply,
        IntakeReply::Clarification { options, .. } if options == vec!["Cardiology".to_string()]
    );

    let reply = engine.select_specialty(session_id, "cardiology").await.unwrap();
    assert_matches!(reply, IntakeReply::Success(_));

    let reply = engine.select_doctor(session_id, "jane smith").await.unwrap();
    assert_matches!(reply, IntakeReply::Success(_));
}

#[tokio::test]
async fn test_end_to_end_intake_and_booking() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();

    walk_to_time_selection(&engine, session_id).await;

    let reply = engine
        .select_time(session_id, "next tuesday at 2", now())
        .await
        .unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.booking_state, BookingState::Confirmed);
    assert_eq!(snapshot.appointment.scheduled_time, Some(at(16, 14)));

    // Persisted records reflect the walk.
    let patient = store.patient_for_session(session_id).await.unwrap().unwrap();
    assert_eq!(patient.name, "Maria Garcia");
    assert_eq!(patient.phone, "5550104433");

    let appointment = store.appointment_for_session(session_id).await.unwrap().unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.patient_id, patient.id);
    assert_eq!(appointment.scheduled_time, Some(at(16, 14)));
    assert!(appointment.slot_id.is_some());
}

#[tokio::test]
async fn test_utterance_registration_is_out_of_order_friendly() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();

    let reply = engine
        .register_utterance(
            session_id,
            "My name is Maria Garcia and I was born on 03/15/1985, phone is 555-010-4433",
        )
        .await
        .unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.patient.name.as_deref(), Some("Maria Garcia"));
    assert_eq!(snapshot.patient.phone.as_deref(), Some("5550104433"));
    assert!(snapshot.missing_fields.contains(&PatientField::Address));

    // Chatter with no recognizable details asks for what is still missing.
    let reply = engine.register_utterance(session_id, "okay, sounds good").await.unwrap();
    assert_matches!(
        reply,
        IntakeReply::Clarification { options, .. } if options.contains(&"address".to_string())
    );
}

#[tokio::test]
async fn test_update_specific_info_changes_only_that_field() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    register(&engine, session_id).await;
    let before = store.patient_for_session(session_id).await.unwrap().unwrap();

    let reply = engine
        .update_confirmed_field(session_id, FieldUpdate::Phone("555-0100".to_string()))
        .await
        .unwrap();
    assert_matches!(reply, IntakeReply::Success(_));

    let after = store.patient_for_session(session_id).await.unwrap().unwrap();
    assert_eq!(after.phone, "5550100");
    assert_eq!(after.id, before.id);
    assert_eq!(after.name, before.name);
    assert_eq!(after.date_of_birth, before.date_of_birth);
    assert_eq!(after.address, before.address);
    assert_eq!(after.chief_complaint, before.chief_complaint);
}

#[tokio::test]
async fn test_booking_requires_confirmed_registration() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();

    let reply = engine.start_booking(session_id).await.unwrap();
    assert_matches!(reply, IntakeReply::Rejected { .. });
}

#[tokio::test]
async fn test_ambiguous_doctor_prompts_with_both_candidates() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    register(&engine, session_id).await;
    engine.start_booking(session_id).await.unwrap();
    engine.select_specialty(session_id, "cardiology").await.unwrap();

    let reply = engine.select_doctor(session_id, "smith").await.unwrap();

    let options = assert_matches!(reply, IntakeReply::Clarification { options, .. } => options);
    assert_eq!(options.len(), 2);
    assert!(options.contains(&"Dr. Jane Smith".to_string()));
    assert!(options.contains(&"Dr. John Smith".to_string()));
}

#[tokio::test]
async fn test_unresolvable_time_becomes_pending_match() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    walk_to_time_selection(&engine, session_id).await;

    let reply = engine
        .select_time(session_id, "sometime when the stars align", now())
        .await
        .unwrap();

    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.booking_state, BookingState::PendingMatch);

    // The parked request keeps everything captured for follow-up.
    let appointment = store.appointment_for_session(session_id).await.unwrap().unwrap();
    assert_eq!(appointment.status, AppointmentStatus::PendingMatch);
    assert!(appointment.specialty_id.is_some());
    assert!(appointment.doctor_id.is_some());
    assert_eq!(
        appointment.requested_time_text.as_deref(),
        Some("sometime when the stars align")
    );
    assert!(appointment.slot_id.is_none());
}

#[tokio::test]
async fn test_alternatives_flow_through_confirm_booking() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    walk_to_time_selection(&engine, session_id).await;

    // Wednesday the 17th at 2 PM is not on the schedule.
    let reply = engine
        .select_time(session_id, "june 17 at 2pm", now())
        .await
        .unwrap();
    assert_matches!(reply, IntakeReply::Clarification { .. });

    // Pick the offered slot straight from the store's remaining openings.
    let open = store
        .appointment_for_session(session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.status, AppointmentStatus::Collecting);

    let snapshot = assert_matches!(
        engine.select_time(session_id, "june 17 at 9am", now()).await.unwrap(),
        IntakeReply::Success(s) => s
    );
    assert_eq!(snapshot.booking_state, BookingState::Confirmed);
    assert_eq!(snapshot.appointment.scheduled_time, Some(at(17, 9)));
}

#[tokio::test]
async fn test_two_sessions_racing_for_one_slot() {
    let (engine, store) = engine_with_store().await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    walk_to_time_selection(&engine, first).await;
    walk_to_time_selection(&engine, second).await;

    let (a, b) = tokio::join!(
        engine.select_time(first, "next tuesday at 2", now()),
        engine.select_time(second, "next tuesday at 2", now()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let confirmed = [&a, &b]
        .iter()
        .filter(|reply| {
            matches!(
                reply,
                IntakeReply::Success(s) if s.booking_state == BookingState::Confirmed
            )
        })
        .count();
    assert_eq!(confirmed, 1, "exactly one session may win the slot");

    // The 2 PM slot was consumed exactly once.
    let specialty_id = store.specialties().await.unwrap()[0].id;
    let jane_id = store
        .doctors_in_specialty(specialty_id)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name == "Dr. Jane Smith")
        .unwrap()
        .id;
    let open = store.unconsumed_slots(jane_id).await.unwrap();
    assert!(open.iter().all(|s| s.start_time != at(16, 14)));
}

#[tokio::test]
async fn test_cancel_then_restart_creates_fresh_draft() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    walk_to_time_selection(&engine, session_id).await;

    let reply = engine.cancel_booking(session_id).await.unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.booking_state, BookingState::Cancelled);

    // Restart begins a new draft from scratch.
    let reply = engine.start_booking(session_id).await.unwrap();
    assert_matches!(reply, IntakeReply::Clarification { .. });
    let reply = engine.select_specialty(session_id, "cardiology").await.unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.booking_state, BookingState::SelectingDoctor);
    assert!(snapshot.appointment.doctor_id.is_none());
}

#[tokio::test]
async fn test_refresh_picks_up_new_reference_data() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    register(&engine, session_id).await;

    let dermatology = Specialty {
        id: Uuid::new_v4(),
        name: "Dermatology".to_string(),
        description: "Skin, hair and nail conditions".to_string(),
        aliases: vec!["skin".to_string(), "rash".to_string()],
    };
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Priya Patel".to_string(),
        specialty_id: dermatology.id,
        bio: None,
    };
    store
        .replace_reference_data(vec![dermatology], vec![doctor], vec![])
        .await;

    // The old index still answers until the explicit refresh.
    engine.start_booking(session_id).await.unwrap();
    let reply = engine.select_specialty(session_id, "dermatology").await.unwrap();
    assert_matches!(reply, IntakeReply::Clarification { .. });

    engine.refresh().await.unwrap();
    let reply = engine.select_specialty(session_id, "dermatology").await.unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.appointment.specialty_name.as_deref(), Some("Dermatology"));
}

#[tokio::test]
async fn test_ended_session_is_dropped_and_restarts_fresh() {
    let (engine, store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    register(&engine, session_id).await;

    assert!(engine.end_session(session_id).await);
    assert!(!engine.end_session(session_id).await);

    // Persisted records survive the ended conversation.
    let patient = store.patient_for_session(session_id).await.unwrap().unwrap();
    assert_eq!(patient.name, "Maria Garcia");

    // A later event under the same id starts from a blank draft.
    let reply = engine
        .register_field_update(session_id, FieldUpdate::Name("Maria Garcia".to_string()))
        .await
        .unwrap();
    let snapshot = assert_matches!(reply, IntakeReply::Success(s) => s);
    assert_eq!(snapshot.registration_state, RegistrationState::Collecting);
    assert!(snapshot.patient.phone.is_none());
}

#[tokio::test]
async fn test_summary_renders_confirmed_booking() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    walk_to_time_selection(&engine, session_id).await;
    engine
        .select_time(session_id, "next tuesday at 2", now())
        .await
        .unwrap();

    let summary = engine.summary(session_id).await;
    let text = summary.render();

    assert!(text.contains("Name: Maria Garcia"));
    assert!(text.contains("Complaint: chest pains and shortness of breath"));
    assert!(text.contains("Status: Appointment successfully booked"));
    assert!(text.contains("Tuesday, June 16, 2026 at 2:00 PM"));
    assert!(text.contains("Doctor: Dr. Jane Smith"));
    assert!(text.contains("Duration: 30 minutes"));
    assert!(text.contains("Your registration and appointment are confirmed"));
}

#[tokio::test]
async fn test_summary_renders_pending_variant() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();
    walk_to_time_selection(&engine, session_id).await;
    engine
        .select_time(session_id, "sometime when the stars align", now())
        .await
        .unwrap();

    let summary = engine.summary(session_id).await;
    let text = summary.render();

    assert!(text.contains("Status: Appointment requested but not confirmed"));
    assert!(text.contains("scheduling team will contact you"));
}

#[tokio::test]
async fn test_reply_serializes_for_the_dialogue_layer() {
    let (engine, _store) = engine_with_store().await;
    let session_id = Uuid::new_v4();

    let reply = engine
        .register_field_update(session_id, FieldUpdate::Name("Maria Garcia".to_string()))
        .await
        .unwrap();

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["reply"], "success");
    assert_eq!(json["patient"]["name"], "Maria Garcia");
}
