//! Seeded clinic catalog used by integration tests: eight specialties with
//! complaint aliases, sixteen doctors, and deterministic availability slots
//! laid out relative to a caller-supplied reference instant.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use shared_models::{AvailabilitySlot, Doctor, Specialty};

use crate::MemoryStore;

const SPECIALTIES: &[(&str, &str, &[&str])] = &[
    (
        "Cardiology",
        "Heart and blood vessel disorders",
        &["heart", "chest pain", "palpitations", "shortness of breath", "blood pressure"],
    ),
    (
        "Ophthalmology",
        "Eye disorders and vision care",
        &["eye", "vision", "blurry vision", "cataract"],
    ),
    (
        "Otolaryngology",
        "Ear, nose, and throat disorders (ENT)",
        &["ear", "nose", "throat", "sinus", "hearing", "sore throat"],
    ),
    (
        "Orthopedics",
        "Bone and joint disorders",
        &["bone", "joint", "knee", "shoulder", "back pain", "fracture", "sprain"],
    ),
    (
        "Neurology",
        "Brain, spinal cord, and nerve disorders",
        &["headache", "migraine", "dizziness", "numbness", "seizure"],
    ),
    (
        "Dermatology",
        "Skin disorders",
        &["skin", "rash", "acne", "mole", "itch"],
    ),
    (
        "Pulmonology",
        "Lung and respiratory disorders",
        &["lung", "breathing", "cough", "asthma", "wheezing"],
    ),
    (
        "Gastroenterology",
        "Digestive system disorders",
        &["stomach", "digestion", "nausea", "abdominal", "heartburn", "bowel"],
    ),
];

const DOCTORS: &[(&str, &str, &str)] = &[
    ("Dr. Jane Smith", "Cardiology", "Specializes in cardiovascular surgery with 15 years of experience"),
    ("Dr. Robert Johnson", "Cardiology", "Expert in cardiac rehabilitation"),
    ("Dr. Sarah Chen", "Ophthalmology", "Specializes in retinal surgery"),
    ("Dr. Michael Torres", "Ophthalmology", "Focused on pediatric eye care"),
    ("Dr. Emily Wilson", "Otolaryngology", "Specializes in voice and swallowing disorders"),
    ("Dr. William Davis", "Otolaryngology", "Expert in sinus surgery"),
    ("Dr. David Lee", "Orthopedics", "Specializes in sports medicine and joint replacement"),
    ("Dr. Jennifer White", "Orthopedics", "Focus on spinal disorders"),
    ("Dr. Richard Brown", "Neurology", "Specializes in stroke treatment and prevention"),
    ("Dr. Rebecca Martinez", "Neurology", "Expert in headache and migraine management"),
    ("Dr. Thomas Jackson", "Dermatology", "Specializes in skin cancer detection and treatment"),
    ("Dr. Lisa Kim", "Dermatology", "Focus on pediatric dermatology"),
    ("Dr. Mark Thompson", "Pulmonology", "Specializes in asthma and COPD management"),
    ("Dr. Elizabeth Clark", "Pulmonology", "Expert in sleep apnea and sleep disorders"),
    ("Dr. Anthony Rodriguez", "Gastroenterology", "Specializes in inflammatory bowel disease"),
    ("Dr. Michelle Patel", "Gastroenterology", "Focus on liver disorders"),
];

const SLOT_HOURS: &[u32] = &[9, 10, 14];
const SLOT_DAY_OFFSETS: &[i64] = &[7, 8];

pub fn sample_catalog(now: DateTime<Utc>) -> (Vec<Specialty>, Vec<Doctor>, Vec<AvailabilitySlot>) {
    let specialties: Vec<Specialty> = SPECIALTIES
        .iter()
        .map(|(name, description, aliases)| Specialty {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        })
        .collect();

    let doctors: Vec<Doctor> = DOCTORS
        .iter()
        .filter_map(|(name, specialty_name, bio)| {
            let specialty = specialties.iter().find(|s| s.name == *specialty_name)?;
            Some(Doctor {
                id: Uuid::new_v4(),
                name: name.to_string(),
                specialty_id: specialty.id,
                bio: Some(bio.to_string()),
            })
        })
        .collect();

    let mut slots = Vec::new();
    for doctor in &doctors {
        for offset in SLOT_DAY_OFFSETS {
            let date = (now + Duration::days(*offset)).date_naive();
            for hour in SLOT_HOURS {
                let time = NaiveTime::from_hms_opt(*hour, 0, 0).unwrap_or(NaiveTime::MIN);
                slots.push(AvailabilitySlot {
                    id: Uuid::new_v4(),
                    doctor_id: doctor.id,
                    start_time: Utc.from_utc_datetime(&date.and_time(time)),
                    duration_minutes: 30,
                    is_consumed: false,
                });
            }
        }
    }

    (specialties, doctors, slots)
}

pub fn sample_store(now: DateTime<Utc>) -> MemoryStore {
    let (specialties, doctors, slots) = sample_catalog(now);
    MemoryStore::with_reference_data(specialties, doctors, slots)
}
