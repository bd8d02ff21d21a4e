use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use doctor_cell::{AvailabilityService, SlotResolution};
use shared_config::AppConfig;
use shared_models::{AvailabilitySlot, ConsumeOutcome};
use shared_store::{ClinicStore, MemoryStore};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap()
}

fn slot(doctor_id: Uuid, start: DateTime<Utc>, consumed: bool) -> AvailabilitySlot {
    AvailabilitySlot {
        id: Uuid::new_v4(),
        doctor_id,
        start_time: start,
        duration_minutes: 30,
        is_consumed: consumed,
    }
}

fn service(slots: Vec<AvailabilitySlot>) -> AvailabilityService {
    let store = Arc::new(MemoryStore::with_reference_data(vec![], vec![], slots));
    AvailabilityService::new(&AppConfig::default(), store)
}

#[tokio::test]
async fn test_exact_time_returns_exact_slot() {
    let doctor_id = Uuid::new_v4();
    let wanted = at(15, 14);
    let service = service(
        vec![slot(doctor_id, at(15, 9), false), slot(doctor_id, wanted, false)],
    );

    let resolution = service.resolve(doctor_id, wanted, at(10, 8)).await.unwrap();

    assert_matches!(resolution, SlotResolution::Exact(s) if s.start_time == wanted);
}

#[tokio::test]
async fn test_consumed_slot_is_never_offered_as_exact() {
    let doctor_id = Uuid::new_v4();
    let wanted = at(15, 14);
    let service = service(
        vec![slot(doctor_id, wanted, true), slot(doctor_id, at(16, 9), false)],
    );

    let resolution = service.resolve(doctor_id, wanted, at(10, 8)).await.unwrap();

    assert_matches!(resolution, SlotResolution::Alternatives(alts) => {
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].start_time, at(16, 9));
    });
}

#[tokio::test]
async fn test_alternatives_are_nearest_first_and_capped() {
    let doctor_id = Uuid::new_v4();
    let service = service(
        vec![
            slot(doctor_id, at(12, 9), false),
            slot(doctor_id, at(14, 9), false),
            slot(doctor_id, at(16, 9), false),
            slot(doctor_id, at(20, 9), false),
        ],
    );

    // Wanted 2026-06-15 09:00; no such slot.
    let resolution = service.resolve(doctor_id, at(15, 9), at(10, 8)).await.unwrap();

    assert_matches!(resolution, SlotResolution::Alternatives(alts) => {
        // Default cap is three; June 20 is furthest and dropped.
        let starts: Vec<_> = alts.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![at(14, 9), at(16, 9), at(12, 9)]);
    });
}

#[tokio::test]
async fn test_past_slots_are_not_offered() {
    let doctor_id = Uuid::new_v4();
    let service = service(
        vec![slot(doctor_id, at(5, 9), false), slot(doctor_id, at(18, 9), false)],
    );

    let resolution = service.resolve(doctor_id, at(15, 9), at(10, 8)).await.unwrap();

    assert_matches!(resolution, SlotResolution::Alternatives(alts) => {
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].start_time, at(18, 9));
    });
}

#[tokio::test]
async fn test_no_open_slots_is_no_availability() {
    let doctor_id = Uuid::new_v4();
    let service = service(vec![slot(doctor_id, at(15, 9), true)]);

    let resolution = service.resolve(doctor_id, at(15, 9), at(10, 8)).await.unwrap();

    assert_matches!(resolution, SlotResolution::NoAvailability);
}

#[tokio::test]
async fn test_consume_is_first_winner_only() {
    let doctor_id = Uuid::new_v4();
    let open = slot(doctor_id, at(15, 9), false);
    let slot_id = open.id;
    let store: Arc<MemoryStore> =
        Arc::new(MemoryStore::with_reference_data(vec![], vec![], vec![open]));
    let service = AvailabilityService::new(&AppConfig::default(), store.clone());

    assert_matches!(service.consume(slot_id).await.unwrap(), ConsumeOutcome::Consumed);
    assert_matches!(service.consume(slot_id).await.unwrap(), ConsumeOutcome::AlreadyConsumed);
    assert!(store.unconsumed_slots(doctor_id).await.unwrap().is_empty());
}
