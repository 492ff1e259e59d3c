use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,-]").expect("valid character class"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Normalize raw OCR output into the form the table engine expects.
///
/// Composes to NFC, strips everything except word characters, whitespace
/// and `. , -`, then collapses whitespace runs and trims.
pub fn normalize_text(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    let kept = DISALLOWED.replace_all(&composed, "");
    WHITESPACE.replace_all(&kept, " ").trim().to_string()
}

/// Join cell fragments with single spaces, substituting `placeholder` when nothing is left.
pub fn join_cell<'a, I>(parts: I, placeholder: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = parts.into_iter().collect::<Vec<_>>().join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}
