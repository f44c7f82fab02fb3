//! Sequence key derivation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a sequence key.
pub const MAX_KEY_LEN: usize = 50;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static VALID_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]{1,50}$").unwrap());

/// Derives a sequence key from a display name.
///
/// The result can be empty (e.g. for a name made only of symbols); check it
/// with [`is_valid_key`] before saving.
///
/// ```
/// use console_core::sequence::generate_key;
///
/// assert_eq!(generate_key("  No Hot Water -- Gas Heater!"), "no-hot-water-gas-heater");
/// ```
pub fn generate_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(&stripped, "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    let trimmed = collapsed.trim_matches('-');

    // Truncation can expose a hyphen at the cut, so trim again.
    let truncated: String = trimmed.chars().take(MAX_KEY_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Whether `key` is an acceptable sequence key.
pub fn is_valid_key(key: &str) -> bool {
    VALID_KEY.is_match(key)
}
