use tracing::debug;

use shared_models::Doctor;
use shared_utils::text::tokenize;

use crate::models::DoctorMatchOutcome;

/// Honorifics stripped from both the spoken name and the roster entry
/// before comparison.
const HONORIFIC_PREFIXES: &[&str] = &["dr", "doctor"];

/// Matches a spoken doctor name against the roster of one specialty.
/// Rules are tried in order; the first rule with any candidates decides
/// the outcome.
pub struct DoctorMatcher {
    doctors: Vec<Doctor>,
    /// Honorific-free name tokens, one entry per doctor.
    name_tokens: Vec<Vec<String>>,
}

impl DoctorMatcher {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        let name_tokens = doctors.iter().map(|d| strip_honorifics(&d.name)).collect();
        Self { doctors, name_tokens }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn match_name(&self, spoken: &str) -> DoctorMatchOutcome {
        let query = strip_honorifics(spoken);
        if query.is_empty() {
            return DoctorMatchOutcome::NoMatch;
        }

        let rules: [fn(&[String], &[String]) -> bool; 3] =
            [exact_full_name, exact_last_name, all_tokens_prefix];

        for rule in rules {
            let candidates: Vec<&Doctor> = self
                .name_tokens
                .iter()
                .zip(&self.doctors)
                .filter(|(name, _)| rule(&query, name))
                .map(|(_, doctor)| doctor)
                .collect();

            match candidates.len() {
                0 => continue,
                1 => {
                    debug!("doctor name {:?} matched {}", spoken, candidates[0].name);
                    return DoctorMatchOutcome::Matched(candidates[0].clone());
                }
                n => {
                    debug!("doctor name {:?} matched {} doctors", spoken, n);
                    return DoctorMatchOutcome::Ambiguous(
                        candidates.into_iter().cloned().collect(),
                    );
                }
            }
        }

        DoctorMatchOutcome::NoMatch
    }
}

fn strip_honorifics(name: &str) -> Vec<String> {
    let mut tokens = tokenize(name);
    while tokens
        .first()
        .is_some_and(|t| HONORIFIC_PREFIXES.contains(&t.as_str()))
    {
        tokens.remove(0);
    }
    tokens
}

fn exact_full_name(query: &[String], name: &[String]) -> bool {
    query == name
}

fn exact_last_name(query: &[String], name: &[String]) -> bool {
    query.len() == 1 && name.last() == query.first()
}

/// Every spoken token is a prefix of some name token ("rob john" finds
/// "Robert Johnson").
fn all_tokens_prefix(query: &[String], name: &[String]) -> bool {
    query
        .iter()
        .all(|q| name.iter().any(|n| n.starts_with(q.as_str())))
}
