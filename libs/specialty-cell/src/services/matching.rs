use tracing::debug;

use shared_config::AppConfig;
use shared_models::Specialty;
use shared_utils::text::{content_tokens, tokenize};

use crate::models::SpecialtyMatch;

struct AliasEntry {
    tokens: Vec<String>,
    text: String,
    specialty_idx: usize,
}

/// Resolves a free-text complaint to a specialty. Pure over the loaded
/// reference data, so a single instance is safe to share across
/// conversations.
pub struct SpecialtyMatcher {
    specialties: Vec<Specialty>,
    /// Longest alias first, so more specific terms win ties.
    alias_index: Vec<AliasEntry>,
    /// Pre-tokenized name + description per specialty for the fallback pass.
    doc_tokens: Vec<Vec<String>>,
    overlap_threshold: f32,
}

impl SpecialtyMatcher {
    pub fn new(config: &AppConfig, specialties: Vec<Specialty>) -> Self {
        let mut alias_index = Vec::new();
        for (idx, specialty) in specialties.iter().enumerate() {
            for alias in &specialty.aliases {
                let tokens = tokenize(alias);
                if tokens.is_empty() {
                    continue;
                }
                alias_index.push(AliasEntry {
                    text: tokens.join(" "),
                    tokens,
                    specialty_idx: idx,
                });
            }
        }
        alias_index.sort_by(|a, b| {
            b.text
                .len()
                .cmp(&a.text.len())
                .then_with(|| specialties[a.specialty_idx].name.cmp(&specialties[b.specialty_idx].name))
        });

        let doc_tokens = specialties
            .iter()
            .map(|s| {
                let mut tokens = content_tokens(&s.name);
                for token in content_tokens(&s.description) {
                    if !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
                tokens
            })
            .collect();

        Self {
            alias_index,
            doc_tokens,
            specialties,
            overlap_threshold: config.specialty_overlap_threshold,
        }
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    /// Resolve a specialty by its canonical name (normalized comparison).
    pub fn by_name(&self, name: &str) -> Option<&Specialty> {
        let wanted = tokenize(name).join(" ");
        self.specialties
            .iter()
            .find(|s| tokenize(&s.name).join(" ") == wanted)
    }

    pub fn match_complaint(&self, complaint: &str) -> Option<SpecialtyMatch> {
        let words = tokenize(complaint);
        if words.is_empty() {
            return None;
        }

        // Alias pass: alias tokens aligned against consecutive complaint
        // words, each alias token a prefix of its word ("chest pain" fires
        // on "chest pains"; "ear" does not fire inside "heart").
        for entry in &self.alias_index {
            if alias_hits(&entry.tokens, &words) {
                let specialty = self.specialties[entry.specialty_idx].clone();
                debug!("complaint matched alias {:?} -> {}", entry.text, specialty.name);
                return Some(SpecialtyMatch {
                    specialty,
                    confidence: 1.0,
                    matched_term: Some(entry.text.clone()),
                });
            }
        }

        // Fallback: token overlap against specialty name + description,
        // gated by the configured minimum-overlap threshold.
        let complaint_tokens = content_tokens(complaint);
        if complaint_tokens.is_empty() {
            return None;
        }
        let mut best: Option<(f32, usize)> = None;
        for (idx, doc) in self.doc_tokens.iter().enumerate() {
            let overlap = complaint_tokens.iter().filter(|t| doc.contains(t)).count();
            if overlap == 0 {
                continue;
            }
            let score = overlap as f32 / complaint_tokens.len() as f32;
            if score >= self.overlap_threshold && best.map_or(true, |(b, _)| score > b) {
                best = Some((score, idx));
            }
        }

        best.map(|(score, idx)| {
            let specialty = self.specialties[idx].clone();
            debug!(
                "complaint matched {} by token overlap (score {:.2})",
                specialty.name, score
            );
            SpecialtyMatch {
                specialty,
                confidence: score,
                matched_term: None,
            }
        })
    }
}

fn alias_hits(alias: &[String], words: &[String]) -> bool {
    if alias.is_empty() || alias.len() > words.len() {
        return false;
    }
    (0..=words.len() - alias.len()).any(|start| {
        alias
            .iter()
            .zip(&words[start..])
            .all(|(token, word)| word.starts_with(token.as_str()))
    })
}
