//! Dice-coefficient string similarity over character bigrams.

use std::collections::HashMap;

/// Shortest string (in characters) that takes part in fuzzy comparison.
///
/// A two-character key has a single bigram, so any header sharing that bigram
/// would score at least 0.5 against it (`"wid"` vs `"id"` scores 0.67). Keys
/// this short only ever match exactly.
pub const MIN_FUZZY_LEN: usize = 3;

fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Similarity of two strings in `[0, 1]`.
///
/// `2 * |shared bigrams| / (|bigrams(a)| + |bigrams(b)|)`, counting repeated
/// bigrams as a multiset. Identical strings score 1.0; strings shorter than
/// [`MIN_FUZZY_LEN`] score 0.0 against anything else.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len < MIN_FUZZY_LEN || b_len < MIN_FUZZY_LEN {
        return 0.0;
    }

    let mut remaining = bigrams(a);
    let mut shared = 0usize;
    for pair in b.chars().collect::<Vec<_>>().windows(2) {
        if let Some(count) = remaining.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2.0 * shared as f64) / ((a_len - 1) + (b_len - 1)) as f64
}

/// Best-scoring candidate for `target`.
///
/// Returns the index into `candidates` and its score; ties keep the earliest
/// candidate. `None` only when `candidates` is empty.
pub fn best_match<'a, I>(target: &str, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.into_iter().enumerate() {
        let score = dice_coefficient(target, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(dice_coefficient("skills", "skills"), 1.0);
        assert_eq!(dice_coefficient("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_scores() {
        // sk ki il | sk ki il ll ls
        assert!((dice_coefficient("skil", "skills") - 0.75).abs() < 1e-12);
        // wi id | st ta af ff fi id
        assert!((dice_coefficient("wid", "staffid") - 0.25).abs() < 1e-12);
        assert!((dice_coefficient("skillset", "reqskills") - 10.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_keys_never_fuzzy_match() {
        assert_eq!(dice_coefficient("wid", "id"), 0.0);
        assert_eq!(dice_coefficient("id", "idx"), 0.0);
        assert_eq!(dice_coefficient("id", "id"), 1.0);
    }

    #[test]
    fn test_repeated_bigrams_count_once_each() {
        // aa aa | aa
        let score = dice_coefficient("aaa", "aa");
        assert_eq!(score, 0.0);
        let score = dice_coefficient("aaaa", "aaa");
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("clientname", "clinetname"), ("duration", "duratoin"), ("maxload", "max_load")];
        for (a, b) in pairs {
            assert!((dice_coefficient(a, b) - dice_coefficient(b, a)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let candidates = ["skills", "skills", "slots"];
        let (idx, score) = best_match("skils", candidates).unwrap();
        assert_eq!(idx, 0);
        assert!(score > 0.5);
        assert!(best_match("x", std::iter::empty()).is_none());
    }
}
