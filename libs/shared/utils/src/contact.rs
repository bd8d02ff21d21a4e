use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)+$").unwrap())
}

/// Normalize a phone number to its digits-only canonical form.
pub fn normalize_phone(raw: &str) -> Result<String, String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err(format!("{:?} does not look like a phone number", raw.trim()));
    }
    Ok(digits)
}

pub fn is_valid_email(raw: &str) -> bool {
    email_re().is_match(raw.trim())
}
