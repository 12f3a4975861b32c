// Jaccard text similarity.
//
// Used to compare a rewritten post against its source: the rewrite service
// returns alternate phrasings, and callers want a cheap overlap measure.
// Word-set Jaccard is enough for that — no semantic model involved.

use std::collections::HashSet;

/// Jaccard similarity over lowercased whitespace-tokenized word sets.
///
/// Returns a value in [0, 1]: 1.0 for identical word sets, 0.0 for
/// disjoint ones. Two empty texts are defined as 0.0 (empty union).
pub fn similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let words_b: HashSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_one() {
        assert!((similarity("launch day is here", "launch day is here") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disjoint_text_is_zero() {
        assert_eq!(similarity("a b", "c d"), 0.0);
    }

    #[test]
    fn case_insensitive() {
        assert!((similarity("Rust IS Fast", "rust is fast") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_overlap() {
        // {a,b,c} vs {b,c,d}: 2 shared / 4 total
        assert!((similarity("a b c", "b c d") - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_words_collapse() {
        assert!((similarity("go go go", "go") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn both_empty_is_zero() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("   ", ""), 0.0);
    }
}
