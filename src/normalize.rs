//! Single-line message normalization.

use regex::Regex;
use std::sync::OnceLock;

static BREAK_REGEX: OnceLock<Regex> = OnceLock::new();

fn break_regex() -> &'static Regex {
    // Whitespace of any kind plus the remaining C0/C1 control characters.
    BREAK_REGEX.get_or_init(|| Regex::new(r"[\s\p{Cc}]+").expect("break regex"))
}

/// Collapse a message onto one line and cap it at `max_len` characters.
///
/// Every run of whitespace or control characters becomes a single space, the
/// result is trimmed, then truncated on a character boundary. Applying this twice
/// with the same `max_len` yields the same string.
pub fn normalize_message(message: &str, max_len: usize) -> String {
    let collapsed = break_regex().replace_all(message, " ");
    let trimmed = collapsed.trim();

    match trimmed.char_indices().nth(max_len) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_line_breaks_and_tabs() {
        assert_eq!(
            normalize_message("  first\r\nsecond\tthird\n\n  fourth  ", 200),
            "first second third fourth"
        );
    }

    #[test]
    fn strips_other_control_characters() {
        assert_eq!(normalize_message("bell\u{7}ring", 200), "bell ring");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(normalize_message("héllo wörld", 4), "héll");
        assert_eq!(normalize_message("ab cd", 3), "ab");
        assert_eq!(normalize_message("abc", 3), "abc");
        assert_eq!(normalize_message("abc", 0), "");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize_message("", 10), "");
        assert_eq!(normalize_message(" \t\r\n ", 10), "");
    }

    proptest! {
        #[test]
        fn output_is_single_line_and_idempotent(input in "\\PC{0,64}[ \\t\\r\\n]{0,4}\\PC{0,64}", max in 0usize..80) {
            let once = normalize_message(&input, max);
            prop_assert!(!once.chars().any(char::is_control));
            prop_assert!(!once.contains("  "));
            prop_assert!(once.chars().count() <= max);
            prop_assert_eq!(normalize_message(&once, max), once.clone());
        }

        #[test]
        fn arbitrary_strings_are_idempotent(input in any::<String>()) {
            let once = normalize_message(&input, 200);
            prop_assert_eq!(normalize_message(&once, 200), once);
        }
    }
}
