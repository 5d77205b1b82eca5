//! Answer canonicalization shared by vocabulary grading and FITB grammar grading.

/// Contraction rewrites, applied in this order. Overlaps are not special-cased:
/// `n't` runs first, so `won't` and `can't` have already become `wo not` and
/// `ca not` by the time their own rules are tried.
const CONTRACTIONS: [(&str, &str); 6] = [
    ("n't", " not"),
    ("'m", " am"),
    ("'re", " are"),
    ("'s", " is"),
    ("won't", "will not"),
    ("can't", "cannot"),
];

/// Lowercase, trim, expand contractions, collapse whitespace runs.
/// Only meant for equality checks; never store or display the output.
pub fn normalize(text: &str) -> String {
    let mut out = text.to_lowercase().trim().to_string();
    for (from, to) in CONTRACTIONS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn answers_match(submitted: &str, canonical: &str) -> bool {
    normalize(submitted) == normalize(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_negative_contraction() {
        assert_eq!(normalize("I don't like it"), normalize("I do not like it"));
    }

    #[test]
    fn expands_is_contraction() {
        assert_eq!(normalize("She's happy"), normalize("She is happy"));
    }

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert!(answers_match("  Apple ", "apple"));
        assert!(answers_match("GOOD   morning", "good morning"));
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("a \t b\n  c"), "a b c");
    }

    #[test]
    fn applies_rules_in_fixed_order() {
        assert_eq!(normalize("won't"), "wo not");
        assert_eq!(normalize("can't"), "ca not");
        assert!(answers_match("I won't go", "i won't go"));
        assert!(!answers_match("I won't go", "I will not go"));
    }

    #[test]
    fn expands_am_and_are() {
        assert!(answers_match("I'm here", "I am here"));
        assert!(answers_match("They're late", "they are late"));
    }

    #[test]
    fn different_words_do_not_match() {
        assert!(!answers_match("doh", "dog"));
        assert!(!answers_match("", "dog"));
    }
}
