//! Coercions for untyped request text.

/// Interprets request text as a boolean.
///
/// Only `"true"`, `"True"` and `"1"` are truthy; everything else, including
/// `"TRUE"` and `"yes"`, is false.
///
/// ```
/// use lfb_core::utils::str_to_bool;
///
/// assert!(str_to_bool("True"));
/// assert!(!str_to_bool("yes"));
/// ```
pub fn str_to_bool(text: &str) -> bool {
    matches!(text, "true" | "True" | "1")
}

/// Returns `true` for the sentinel strings that stand for "no value".
pub fn is_null_sentinel(text: &str) -> bool {
    matches!(text, "None" | "null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy() {
        assert!(str_to_bool("true"));
        assert!(str_to_bool("True"));
        assert!(str_to_bool("1"));
    }

    #[test]
    fn test_falsy() {
        for text in ["false", "False", "0", "", "TRUE", "yes", " true"] {
            assert!(!str_to_bool(text), "{text:?} should be false");
        }
    }

    #[test]
    fn test_null_sentinels() {
        assert!(is_null_sentinel("None"));
        assert!(is_null_sentinel("null"));
        assert!(!is_null_sentinel("NULL"));
        assert!(!is_null_sentinel(""));
    }
}
