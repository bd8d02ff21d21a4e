use serde::{Deserialize, Serialize};

use shared_models::{AvailabilitySlot, Doctor};

/// Outcome of matching a spoken doctor name against a specialty's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DoctorMatchOutcome {
    Matched(Doctor),
    /// More than one doctor fits; the caller should ask which one.
    Ambiguous(Vec<Doctor>),
    NoMatch,
}

/// Outcome of resolving a desired appointment time against a doctor's
/// open slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum SlotResolution {
    /// A slot starts at exactly the desired time.
    Exact(AvailabilitySlot),
    /// Nearest open slots to the desired time, closest first.
    Alternatives(Vec<AvailabilitySlot>),
    NoAvailability,
}
