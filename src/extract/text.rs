//! Whitespace normalization for extracted text.

/// Collapse every run of whitespace (spaces, tabs, newlines, Unicode spaces) to one space and
/// trim both ends. Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
