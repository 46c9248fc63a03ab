//! Candidate generation: turning a stem and an attempt index into a name.

/// Default maximum number of candidates probed per requested name.
pub const DEFAULT_LIMIT: u64 = 10_000;

/// How numbered candidates are spelled.
///
/// Attempt 0 is always the stem itself. Later attempts either continue a
/// trailing number already present in the stem (`run07` -> `run08`) or append
/// `separator` and a counter (`draft` -> `draft_1`).
///
/// ```
/// use unoccupied::Numbering;
///
/// let numbering = Numbering::default().with_separator("-").with_width(2);
/// assert_eq!(numbering.candidate("draft", 0).as_deref(), Some("draft"));
/// assert_eq!(numbering.candidate("draft", 1).as_deref(), Some("draft-01"));
/// assert_eq!(numbering.candidate("run7", 3).as_deref(), Some("run10"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    separator: String,
    start: u64,
    width: usize,
    limit: u64,
    increment_trailing: bool,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            separator: "_".to_owned(),
            start: 1,
            width: 0,
            limit: DEFAULT_LIMIT,
            increment_trailing: true,
        }
    }
}

impl Numbering {
    /// Text placed between the stem and an appended counter.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// First counter value appended to the stem.
    #[must_use]
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Minimum number of digits in an appended counter (zero padded).
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Maximum number of candidates, the bare stem included.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a number already ending the stem is continued instead of
    /// appending a new counter.
    #[must_use]
    pub fn increment_trailing(mut self, enabled: bool) -> Self {
        self.increment_trailing = enabled;
        self
    }

    /// Maximum number of candidates.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The candidate for `attempt`, or `None` once the sequence is exhausted.
    #[must_use]
    pub fn candidate(&self, stem: &str, attempt: u64) -> Option<String> {
        if attempt >= self.limit {
            return None;
        }
        if attempt == 0 {
            return Some(stem.to_owned());
        }

        if self.increment_trailing {
            if let Some((prefix, digits, n)) = split_trailing_number(stem) {
                let next = n.checked_add(attempt)?;
                return Some(format!("{prefix}{next:0width$}", width = digits.len()));
            }
        }

        let n = self.start.checked_add(attempt - 1)?;
        Some(format!(
            "{stem}{sep}{n:0width$}",
            sep = self.separator,
            width = self.width
        ))
    }
}

/// Split `run007` into (`run`, `007`, 7). Returns `None` when the stem does
/// not end in digits or the digits overflow `u64`.
fn split_trailing_number(stem: &str) -> Option<(&str, &str, u64)> {
    let prefix_len = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, digits) = stem.split_at(prefix_len);
    if digits.is_empty() {
        return None;
    }
    let n = digits.parse().ok()?;
    Some((prefix, digits, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_zero_is_the_stem() {
        let numbering = Numbering::default();
        assert_eq!(numbering.candidate("draft", 0).as_deref(), Some("draft"));
        assert_eq!(numbering.candidate("run07", 0).as_deref(), Some("run07"));
    }

    #[test]
    fn appends_separator_and_counter() {
        let numbering = Numbering::default();
        assert_eq!(numbering.candidate("draft", 1).as_deref(), Some("draft_1"));
        assert_eq!(numbering.candidate("draft", 2).as_deref(), Some("draft_2"));
    }

    #[test]
    fn start_and_width_apply_to_appended_counter() {
        let numbering = Numbering::default()
            .with_separator(" ")
            .with_start(0)
            .with_width(3);
        assert_eq!(numbering.candidate("copy", 1).as_deref(), Some("copy 000"));
        assert_eq!(numbering.candidate("copy", 12).as_deref(), Some("copy 011"));
    }

    #[test]
    fn trailing_number_is_continued_with_padding() {
        let numbering = Numbering::default();
        assert_eq!(numbering.candidate("run07", 1).as_deref(), Some("run08"));
        assert_eq!(numbering.candidate("run07", 3).as_deref(), Some("run10"));
        assert_eq!(numbering.candidate("img9", 1).as_deref(), Some("img10"));
        assert_eq!(numbering.candidate("007", 1).as_deref(), Some("008"));
        assert_eq!(numbering.candidate("99", 1).as_deref(), Some("100"));
    }

    #[test]
    fn trailing_increment_can_be_disabled() {
        let numbering = Numbering::default().increment_trailing(false);
        assert_eq!(numbering.candidate("run07", 1).as_deref(), Some("run07_1"));
    }

    #[test]
    fn oversized_trailing_digits_fall_back_to_appending() {
        let stem = "x99999999999999999999999";
        let numbering = Numbering::default();
        assert_eq!(
            numbering.candidate(stem, 1),
            Some(format!("{stem}_1"))
        );
    }

    #[test]
    fn limit_exhausts_sequence() {
        let numbering = Numbering::default().with_limit(3);
        assert!(numbering.candidate("a", 2).is_some());
        assert!(numbering.candidate("a", 3).is_none());
        assert!(Numbering::default().with_limit(0).candidate("a", 0).is_none());
    }

    #[test]
    fn overflow_exhausts_sequence() {
        let numbering = Numbering::default()
            .with_start(u64::MAX)
            .with_limit(u64::MAX);
        assert!(numbering.candidate("a", 1).is_some());
        assert!(numbering.candidate("a", 2).is_none());

        let max = u64::MAX.to_string();
        assert!(Numbering::default().with_limit(u64::MAX).candidate(&max, 1).is_none());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn candidates_are_distinct(stem in "[a-z]{1,8}[0-9]{0,3}", sep in "[-_ ]") {
                let numbering = Numbering::default().with_separator(sep).with_limit(200);
                let mut seen = HashSet::new();
                for attempt in 0..numbering.limit() {
                    let candidate = numbering.candidate(&stem, attempt).unwrap();
                    prop_assert!(seen.insert(candidate));
                }
            }

            #[test]
            fn candidates_keep_the_prefix(stem in "[a-z]{1,8}", attempt in 0u64..1000) {
                let candidate = Numbering::default().candidate(&stem, attempt).unwrap();
                prop_assert!(candidate.starts_with(&stem));
            }
        }
    }
}
