use std::env;
use std::str::FromStr;
use tracing::warn;

/// Tunables for the intake core. Matching thresholds and canonical hours are
/// configuration data rather than inferred constants so their behavior stays
/// auditable.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Minimum ratio of complaint tokens overlapping a specialty's
    /// name/description before a fallback suggestion is offered.
    pub specialty_overlap_threshold: f32,
    /// Maximum number of nearest alternative slots to offer.
    pub max_slot_alternatives: usize,
    /// Default appointment length when the slot does not say otherwise.
    pub default_duration_minutes: i32,
    /// Canonical hours for "morning" / "afternoon" / "evening".
    pub morning_hour: u32,
    pub afternoon_hour: u32,
    pub evening_hour: u32,
    /// Location line rendered on confirmation summaries.
    pub clinic_location: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            specialty_overlap_threshold: parse_env("SPECIALTY_OVERLAP_THRESHOLD", 0.2),
            max_slot_alternatives: parse_env("MAX_SLOT_ALTERNATIVES", 3),
            default_duration_minutes: parse_env("DEFAULT_APPOINTMENT_MINUTES", 30),
            morning_hour: parse_env("MORNING_HOUR", 9),
            afternoon_hour: parse_env("AFTERNOON_HOUR", 14),
            evening_hour: parse_env("EVENING_HOUR", 18),
            clinic_location: env::var("CLINIC_LOCATION")
                .unwrap_or_else(|_| "Assort Medical Clinic Main Campus".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            specialty_overlap_threshold: 0.2,
            max_slot_alternatives: 3,
            default_duration_minutes: 30,
            morning_hour: 9,
            afternoon_hour: 14,
            evening_hour: 18,
            clinic_location: "Assort Medical Clinic Main Campus".to_string(),
        }
    }
}

fn parse_env<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an unparseable value, using default", key);
            default
        }),
        Err(_) => default,
    }
}
