/// Filler words ignored by the token-overlap fallback scorer.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "the", "my", "i", "is", "am", "are", "of", "in", "on", "for",
    "have", "has", "had", "with", "to", "me", "it", "been", "some", "bad", "really",
];

/// Lowercase, map punctuation to spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Distinct non-stopword tokens, in first-seen order.
pub fn content_tokens(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for token in tokenize(text) {
        if !STOPWORDS.contains(&token.as_str()) && !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Chest PAIN, and -- shortness!  "), "chest pain and shortness");
    }

    #[test]
    fn content_tokens_drop_stopwords_and_duplicates() {
        let tokens = content_tokens("my stomach hurts and my stomach aches");
        assert_eq!(tokens, vec!["stomach", "hurts", "aches"]);
    }
}
