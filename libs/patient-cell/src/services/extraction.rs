use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::FieldUpdate;

/// Enumerated per-field pattern tables for mining field values out of a
/// free-form utterance. First matching pattern per field wins; a single
/// utterance can yield several updates ("My name is X and I was born on Y").
struct PatternTable {
    name: Vec<Regex>,
    dob: Vec<Regex>,
    phone: Vec<Regex>,
    email: Vec<Regex>,
    insurance_id: Vec<Regex>,
    insurance: Vec<Regex>,
    complaint: Vec<Regex>,
    address: Vec<Regex>,
    referral_named: Vec<Regex>,
    referral_yes: Vec<Regex>,
    referral_no: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

fn table() -> &'static PatternTable {
    static TABLE: OnceLock<PatternTable> = OnceLock::new();
    TABLE.get_or_init(|| PatternTable {
        name: compile(&[
            r"(?i)\bmy name is ([A-Za-z][A-Za-z\s.'-]*)",
            r"(?i)\bname is ([A-Za-z][A-Za-z\s.'-]*)",
            r"(?i)\bname:\s*([A-Za-z][A-Za-z\s.'-]*)",
            r"(?i)\bthis is ([A-Za-z][A-Za-z\s.'-]*)",
        ]),
        dob: compile(&[
            r"(?i)\bborn on (\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?i)\bbirthday is (\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?i)\bdate of birth:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?i)\bbirth date:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?i)\bdob:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?i)\bborn (?:on|in) ([A-Za-z]+ \d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})",
        ]),
        phone: compile(&[
            r"(?i)\bphone(?:\s+number)? is (\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
            r"(?i)\bphone(?:\s+number)?:?\s*(\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
            r"(?i)\bcall me at (\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
            r"(?i)\bmy number is (\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
        ]),
        email: compile(&[
            r"(?i)\bemail is ([\w.+-]+@[\w.-]+\.\w+)",
            r"(?i)\bemail:?\s*([\w.+-]+@[\w.-]+\.\w+)",
            r"(?i)\bcontact me at ([\w.+-]+@[\w.-]+\.\w+)",
        ]),
        // Checked before the generic insurance patterns so "insurance ID
        // is ..." is not swallowed as a provider name.
        insurance_id: compile(&[
            r"(?i)\binsurance id(?:\s+number)? is ([A-Za-z0-9-]+)",
            r"(?i)\binsurance id(?:\s+number)?:?\s*([A-Za-z0-9-]+)",
            r"(?i)\bid number is ([A-Za-z0-9-]+)",
            r"(?i)\bpolicy number:?\s*([A-Za-z0-9-]+)",
        ]),
        insurance: compile(&[
            r"(?i)\binsurance(?:\s+provider)? is ([A-Za-z][A-Za-z\s&.-]*)",
            r"(?i)\bi have ([A-Za-z][A-Za-z\s&.-]*) insurance",
            r"(?i)\bcovered by ([A-Za-z][A-Za-z\s&.-]*)",
        ]),
        complaint: compile(&[
            r"(?i)\bhere because of ([^.!?]+)",
            r"(?i)\bproblem is ([^.!?]+)",
            r"(?i)\bissue is ([^.!?]+)",
            r"(?i)\bcomplaint is ([^.!?]+)",
            r"(?i)\bsuffering from ([^.!?]+)",
            r"(?i)\bhaving ([^.!?]+)",
        ]),
        address: compile(&[
            r"(?i)\baddress is ([A-Za-z0-9][A-Za-z0-9\s.,#-]*)",
            r"(?i)\baddress:\s*([A-Za-z0-9][A-Za-z0-9\s.,#-]*)",
            r"(?i)\bi live at ([A-Za-z0-9][A-Za-z0-9\s.,#-]*)",
            r"(?i)\breside at ([A-Za-z0-9][A-Za-z0-9\s.,#-]*)",
        ]),
        referral_named: compile(&[
            r"(?i)\breferred (?:to you )?by (?:dr\.?\s+|doctor\s+)?([A-Za-z][A-Za-z\s.'-]*)",
            r"(?i)\breferral from (?:dr\.?\s+|doctor\s+)?([A-Za-z][A-Za-z\s.'-]*)",
        ]),
        referral_yes: compile(&[r"(?i)\bi have a referral\b"]),
        referral_no: compile(&[
            r"(?i)\bno referral\b",
            r"(?i)\bdon'?t have a referral\b",
            r"(?i)\bdo not have a referral\b",
            r"(?i)\bwasn'?t referred\b",
        ]),
    })
}

/// Mine zero or more typed field updates out of a raw utterance.
pub fn extract_updates(utterance: &str) -> Vec<FieldUpdate> {
    let table = table();
    let mut updates = Vec::new();

    if let Some(value) = first_capture(&table.name, utterance) {
        updates.push(FieldUpdate::Name(title_case(&cut_conjunction(&value))));
    }
    if let Some(value) = first_capture(&table.dob, utterance) {
        updates.push(FieldUpdate::DateOfBirth(value));
    }
    if let Some(value) = first_capture(&table.phone, utterance) {
        updates.push(FieldUpdate::Phone(value));
    }
    if let Some(value) = first_capture(&table.email, utterance) {
        updates.push(FieldUpdate::Email(value.to_lowercase()));
    }
    if let Some(value) = first_capture(&table.insurance_id, utterance) {
        updates.push(FieldUpdate::InsuranceId(value));
    }
    if let Some(value) = first_capture(&table.insurance, utterance) {
        updates.push(FieldUpdate::InsuranceProvider(title_case(&cut_conjunction(&value))));
    }
    if let Some(value) = first_capture(&table.complaint, utterance) {
        updates.push(FieldUpdate::ChiefComplaint(value));
    }
    if let Some(value) = first_capture(&table.address, utterance) {
        updates.push(FieldUpdate::Address(cut_conjunction(&value)));
    }
    if let Some(physician) = first_capture(&table.referral_named, utterance) {
        updates.push(FieldUpdate::Referral {
            has_referral: true,
            referred_physician: Some(title_case(&cut_conjunction(&physician))),
        });
    } else if table.referral_no.iter().any(|re| re.is_match(utterance)) {
        updates.push(FieldUpdate::Referral {
            has_referral: false,
            referred_physician: None,
        });
    } else if table.referral_yes.iter().any(|re| re.is_match(utterance)) {
        updates.push(FieldUpdate::Referral {
            has_referral: true,
            referred_physician: None,
        });
    }

    if !updates.is_empty() {
        debug!("extracted {} field updates from utterance", updates.len());
    }
    updates
}

fn first_capture(patterns: &[Regex], utterance: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(utterance)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(['.', ',']).trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Prose captures are greedy; stop them at the next sentence or clause so
/// "Jane Smith and my birthday is ..." yields just the name.
fn cut_conjunction(value: &str) -> String {
    let sentence = value.split(". ").next().unwrap_or(value);
    sentence
        .split(" and ")
        .next()
        .unwrap_or(sentence)
        .trim()
        .trim_end_matches([',', '.'])
        .to_string()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
