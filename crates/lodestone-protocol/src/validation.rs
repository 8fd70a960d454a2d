//! Advisory validation of echoed trait tokens.
//!
//! The reader firmware upper-cases every trait token it stores, so a token
//! that comes back with lower-case characters means the read was truncated or
//! garbled in transit. This check is not a security boundary; it exists so
//! the session can re-request a read instead of handing corrupt data upward.

use lodestone_core::constants::TRAIT_SENTINEL_EMPTY;

/// Check whether an echoed trait list looks like an intact read.
///
/// Rejects when:
/// - the list is empty, or its first token is the `EMPTY` sentinel (a blank
///   tag, not sample data),
/// - the first token is not one of the sample kind tags `RAW`, `REFINED`,
///   `BLOOD` (exact, upper-case — the tags are written by the firmware, not
///   by users),
/// - any later token contains a lower-case character.
///
/// # Examples
///
/// ```
/// use lodestone_protocol::validate_trait_args;
///
/// assert!(validate_trait_args(&["RAW", "CREATING", "KRYSTAL"]));
/// assert!(!validate_trait_args(&["EMPTY"]));
/// assert!(!validate_trait_args(&["RAW", "Creating"]));
/// ```
#[must_use]
pub fn validate_trait_args<S: AsRef<str>>(args: &[S]) -> bool {
    let Some(first) = args.first() else {
        return false;
    };
    let first = first.as_ref();

    // A tag with no sample on it answers with the EMPTY sentinel.
    if first == TRAIT_SENTINEL_EMPTY {
        return false;
    }

    if !matches!(first, "RAW" | "REFINED" | "BLOOD") {
        return false;
    }

    args[1..]
        .iter()
        .all(|token| !token.as_ref().chars().any(char::is_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["RAW", "CREATING", "KRYSTAL", "DESTROYING", "ENERGY", "ACTIVE"], true)]
    #[case(&["REFINED", "HEATING", "SOLID", "COOLING", "GAS", "LUCID"], true)]
    #[case(&["BLOOD", "INCREASING", "KRYSTAL", "WEAK"], true)]
    // Bare kind tag: nothing after it to disqualify the read.
    #[case(&["RAW"], true)]
    #[case(&["EMPTY"], false)]
    #[case(&["EMPTY", "RAW", "CREATING"], false)]
    #[case(&["CRUDE", "CREATING"], false)]
    // Kind tags are firmware output and must arrive exactly upper-case.
    #[case(&["raw", "CREATING"], false)]
    #[case(&["RAW", "Creating"], false)]
    #[case(&["RAW", "CREATING", "kRYSTAL"], false)]
    fn validates_trait_lists(#[case] args: &[&str], #[case] expected: bool) {
        assert_eq!(validate_trait_args(args), expected);
    }

    #[test]
    fn rejects_empty_list() {
        assert!(!validate_trait_args::<&str>(&[]));
    }

    #[test]
    fn digits_and_punctuation_are_not_lowercase() {
        assert!(validate_trait_args(&["RAW", "X-1", "42"]));
    }

    proptest! {
        #[test]
        fn accepts_uppercase_lists(
            kind in "RAW|REFINED|BLOOD",
            tokens in proptest::collection::vec("[A-Z0-9]{1,12}", 0..6),
        ) {
            let mut args = vec![kind];
            args.extend(tokens);
            prop_assert!(validate_trait_args(&args));
        }

        #[test]
        fn rejects_any_lowercase_trailing_token(
            kind in "RAW|REFINED|BLOOD",
            clean in proptest::collection::vec("[A-Z]{1,8}", 0..3),
            dirty in "[A-Z]{0,4}[a-z]{1,4}[A-Z]{0,4}",
            rest in proptest::collection::vec("[A-Z]{1,8}", 0..3),
        ) {
            let mut args = vec![kind];
            args.extend(clean);
            args.push(dirty);
            args.extend(rest);
            prop_assert!(!validate_trait_args(&args));
        }
    }
}
