//! Header normalization.

/// Canonicalize a raw header into a comparison token.
///
/// Lowercases the input and keeps only `[a-z0-9]`; whitespace, punctuation and
/// non-ASCII characters are dropped. Every header comparison in the crate goes
/// through this function, so two headers are "the same" exactly when their
/// normalized forms are equal.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
