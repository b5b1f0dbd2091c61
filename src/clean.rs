//! String normaliser for code-table values.
//!
//! Symphony's code definition files carry stray shell punctuation that must
//! not leak into JSON keys. Data-code values additionally become snake_case
//! identifiers; command-code values keep their spaces and capitalisation.

/// Characters stripped from every normalised string.
///
/// Underscore is intentionally absent: canonical field names contain it, and
/// normalising an already-canonical value must be a no-op.
const PUNCTUATION: &[char] = &[
    '\\', '/', '`', '*', '{', '}', '[', ']', '(', ')', '<', '>', '!', '$', ',', '\'',
];

/// Clean a code-table value.
///
/// Removes the fixed punctuation set. With `fold_spaces` set, trailing
/// whitespace is dropped, interior whitespace runs collapse to a single
/// underscore, and the result is lowercased — the shape used for data-code
/// field names. Without it, spaces and case are preserved (command names).
///
/// Applying the function twice yields the same output as applying it once.
pub fn clean_string(s: &str, fold_spaces: bool) -> String {
    let stripped: String = s.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
    if !fold_spaces {
        return stripped;
    }
    let mut out = String::with_capacity(stripped.len());
    let mut in_gap = false;
    for c in stripped.trim_end().chars() {
        if c.is_whitespace() {
            in_gap = true;
            continue;
        }
        if in_gap {
            out.push('_');
            in_gap = false;
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSY: &str = "This [isn't] a \\$tring th*t i've (liked) until_now} ";

    #[test]
    fn test_clean_preserves_spaces_and_case() {
        assert_eq!(
            clean_string(MESSY, false),
            "This isnt a tring tht ive liked until_now "
        );
    }

    #[test]
    fn test_clean_folds_to_snake_case() {
        assert_eq!(
            clean_string(MESSY, true),
            "this_isnt_a_tring_tht_ive_liked_until_now"
        );
    }

    #[test]
    fn test_clean_collapses_interior_runs() {
        assert_eq!(clean_string("Date  of   Discharge", true), "date_of_discharge");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean_string(MESSY, true);
        assert_eq!(clean_string(&once, true), once);
        let once = clean_string(MESSY, false);
        assert_eq!(clean_string(&once, false), once);
    }

    #[test]
    fn test_clean_keeps_canonical_names_intact() {
        assert_eq!(clean_string("date_of_discharge", true), "date_of_discharge");
        assert_eq!(clean_string("Discharge Item", false), "Discharge Item");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_string("", true), "");
        assert_eq!(clean_string("", false), "");
    }
}
