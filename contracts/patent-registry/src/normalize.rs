//! Patent-number normalization.
//!
//! The registry never compares raw patent-number strings: uniqueness is keyed
//! on the sha256 of the normalized form so that formatting variants
//! ("US-1234567", "us 1234567", "US1234567") all claim the same slot.

use near_sdk::env;

/// Single pass over the input: drops spaces and dashes, uppercases ASCII
/// letters. Pure function with no hidden state.
pub fn normalize_patent_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Storage key for the uniqueness mapping: sha256 of the normalized form.
pub fn patent_key(raw: &str) -> Vec<u8> {
    env::sha256(normalize_patent_number(raw).as_bytes())
}
