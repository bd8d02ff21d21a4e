use serde::{Deserialize, Serialize};

use shared_models::Specialty;

/// A complaint resolved to a specialty. Alias hits carry confidence 1.0;
/// fallback suggestions carry their overlap score and no matched term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyMatch {
    pub specialty: Specialty,
    pub confidence: f32,
    pub matched_term: Option<String>,
}
