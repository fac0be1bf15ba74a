//! Numeric-aware ordering of reference codes.
//!
//! A reference code is split into maximal digit runs and maximal non-digit
//! runs. Digit runs compare by value and sort before text at the same
//! position; text runs compare case-insensitively. A code that is a prefix of
//! another sorts first, so `"5"` precedes `"5.1"`.

use std::cmp::Ordering;

/// One run of a reference code.
///
/// Variant order matters: numbers rank before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Run {
    /// Digit run with leading zeros removed, compared by length then digits
    /// so arbitrarily long runs keep numeric order without overflow.
    Number { len: usize, digits: String },
    /// Lowercased non-digit run.
    Text(String),
}

/// Totally ordered sort key for a reference code.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::natural::NaturalKey;
///
/// assert!(NaturalKey::new("1.2") < NaturalKey::new("1.10"));
/// assert!(NaturalKey::new("AC-2") < NaturalKey::new("AC-10"));
/// assert!(NaturalKey::new("5") < NaturalKey::new("5.1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Run>);

impl NaturalKey {
    /// Build the key for a reference code.
    #[must_use]
    pub fn new(ref_code: &str) -> Self {
        let mut runs = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for c in ref_code.chars() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != in_digits {
                runs.push(Self::finish_run(&current, in_digits));
                current.clear();
            }
            in_digits = is_digit;
            current.push(c);
        }
        if !current.is_empty() {
            runs.push(Self::finish_run(&current, in_digits));
        }

        Self(runs)
    }

    fn finish_run(run: &str, digits: bool) -> Run {
        if digits {
            let trimmed = run.trim_start_matches('0');
            Run::Number {
                len: trimmed.len(),
                digits: trimmed.to_string(),
            }
        } else {
            Run::Text(run.to_lowercase())
        }
    }

    /// Whether the key came from an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compare two reference codes naturally, falling back to the raw strings so
/// codes with equal keys (e.g. `"01"` and `"1"`) still order deterministically.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a)
        .cmp(&NaturalKey::new(b))
        .then_with(|| a.cmp(b))
}

/// Sort reference codes in natural order.
pub fn sort_refs<S: AsRef<str>>(refs: &mut [S]) {
    refs.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted(refs: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = refs.iter().map(|s| s.to_string()).collect();
        sort_refs(&mut v);
        v
    }

    #[test]
    fn test_numeric_runs_compare_by_value() {
        assert!(NaturalKey::new("2") < NaturalKey::new("10"));
        assert!(NaturalKey::new("9") < NaturalKey::new("10"));
        assert!(NaturalKey::new("100") > NaturalKey::new("99"));
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(NaturalKey::new("01"), NaturalKey::new("1"));
        assert!(NaturalKey::new("GV.RM-02") < NaturalKey::new("GV.RM-10"));
        assert_eq!(compare("01", "1"), Ordering::Less);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert!(NaturalKey::new("5") < NaturalKey::new("5.1"));
        assert!(NaturalKey::new("AC-16") < NaturalKey::new("AC-16(1)"));
        assert!(NaturalKey::new("164.306") < NaturalKey::new("164.306(a)"));
    }

    #[test]
    fn test_numbers_before_text() {
        assert!(NaturalKey::new("1") < NaturalKey::new("a"));
        assert!(NaturalKey::new("A.1") < NaturalKey::new("A.a"));
    }

    #[test]
    fn test_case_insensitive_text() {
        assert_eq!(NaturalKey::new("gv.rm"), NaturalKey::new("GV.RM"));
    }

    #[test]
    fn test_empty_sorts_first() {
        assert!(NaturalKey::new("").is_empty());
        assert!(NaturalKey::new("") < NaturalKey::new("0"));
        assert!(NaturalKey::new("") < NaturalKey::new("A"));
    }

    #[test]
    fn test_long_digit_runs() {
        assert!(NaturalKey::new("99999999999999999999999") < NaturalKey::new("100000000000000000000000"));
    }

    #[test]
    fn test_sort_mixed_codes() {
        assert_eq!(
            sorted(&["1.10", "1.2", "1.9", "1.1"]),
            vec!["1.1", "1.2", "1.9", "1.10"]
        );
        assert_eq!(
            sorted(&["AC-10", "AC-2", "AC-1", "AC-2(1)"]),
            vec!["AC-1", "AC-2", "AC-2(1)", "AC-10"]
        );
        assert_eq!(
            sorted(&["APO01.10", "APO01.02", "APO01"]),
            vec!["APO01", "APO01.02", "APO01.10"]
        );
    }

    proptest! {
        /// Codes that differ only in one digit run order by that run's value,
        /// whatever its width.
        #[test]
        fn numeric_run_orders_by_value(
            prefix in "[A-Za-z.-]{0,6}",
            suffix in "[A-Za-z.()-]{0,4}",
            a in any::<u64>(),
            b in any::<u64>(),
            pad_a in 0usize..4,
            pad_b in 0usize..4,
        ) {
            let left = format!("{prefix}{}{a}{suffix}", "0".repeat(pad_a));
            let right = format!("{prefix}{}{b}{suffix}", "0".repeat(pad_b));
            prop_assert_eq!(NaturalKey::new(&left).cmp(&NaturalKey::new(&right)), a.cmp(&b));
        }

        #[test]
        fn compare_is_total_and_antisymmetric(a in "[0-9A-Za-z.()-]{0,10}", b in "[0-9A-Za-z.()-]{0,10}") {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
            prop_assert_eq!(compare(&a, &b) == Ordering::Equal, a == b);
        }
    }
}
