use std::sync::LazyLock;

use regex::Regex;

static NOISE_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(the|license|version)\b").expect("valid regex"));

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("valid regex"));

static DESCRIPTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s|,|\blicense\b|\bversion\b").expect("valid regex"));

/// Reduce a license label to a punctuation- and case-insensitive key.
///
/// `"Apache License, Version 2.0"` and `"Apache-2.0"` both become
/// `"apache20"`. Returns `None` when nothing is left.
pub fn fingerprint(label: &str) -> Option<String> {
    let lower = label.to_lowercase();
    let without_noise = NOISE_WORDS.replace_all(&lower, "");
    let normalized = NON_ALNUM.replace_all(&without_noise, "");

    if normalized.is_empty() {
        None
    } else {
        Some(normalized.into_owned())
    }
}

/// Whether two labels name the same license, verbatim or by fingerprint.
pub fn matches(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }

    match (fingerprint(left), fingerprint(right)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

/// Whether a label already reads like a short SPDX-style token.
///
/// Descriptive labels contain whitespace, commas, or the words
/// "license"/"version".
pub fn looks_canonical(label: &str) -> bool {
    !DESCRIPTIVE.is_match(label)
}
