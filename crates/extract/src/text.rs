use sha2::{Digest, Sha256};

/// Lower-case and collapse runs of whitespace into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when `word` equals its own title-case form: upper-case letters only
/// follow uncased characters, lower-case letters only follow cased ones, and
/// at least one letter is present.
pub fn is_title_case(word: &str) -> bool {
    let mut previous_is_cased = false;
    let mut cased = false;

    for c in word.chars() {
        if c.is_uppercase() {
            if previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else {
            previous_is_cased = false;
        }
    }

    cased
}

/// Title-cased tokens longer than three characters look like named concepts.
pub fn is_entity_candidate(token: &str) -> bool {
    is_title_case(token) && token.chars().count() > 3
}

/// Stable entity ID: 16 hex characters of SHA-256 over the normalized text.
pub fn entity_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_text(text).as_bytes());
    hex::encode(&hasher.finalize()[..8])
}
