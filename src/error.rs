//! Error types returned by the search functions and finders.

use thiserror::Error;

use crate::validation::InvalidName;

/// Every candidate for a requested name was occupied.
///
/// ```
/// use unoccupied::{unoccupied, Numbering, NumberNameFinder, UnoccupiedError};
///
/// let finder = NumberNameFinder::new(["a", "a_1"])
///     .with_numbering(Numbering::default().with_limit(2));
/// match unoccupied("a", &finder) {
///     Err(UnoccupiedError::NotFound(e)) => assert_eq!(e.attempts(), 2),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no unoccupied name found for `{name}` after {attempts} candidates")]
pub struct UnoccupiedNameNotFound {
    name: String,
    attempts: u64,
}

impl UnoccupiedNameNotFound {
    pub(crate) fn new(name: impl Into<String>, attempts: u64) -> Self {
        Self {
            name: name.into(),
            attempts,
        }
    }

    /// The name that was requested.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many candidates were probed before giving up.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

/// A finder could not decide whether a candidate is occupied.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// The file system refused to answer.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The HTTP request failed with something other than `404`.
    #[error("http: {0}")]
    Http(#[from] Box<ureq::Error>),
}

/// Errors returned by [`unoccupied`](crate::unoccupied) and friends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnoccupiedError {
    /// The requested name is not acceptable to the finder.
    #[error("invalid: {0}")]
    InvalidName(#[from] InvalidName),
    /// All candidates were occupied.
    #[error(transparent)]
    NotFound(#[from] UnoccupiedNameNotFound),
    /// Probing a candidate failed.
    #[error("probing `{candidate}` failed: {source}")]
    Probe {
        /// The candidate being probed.
        candidate: String,
        /// The underlying failure.
        source: ProbeError,
    },
    /// A probe thread panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UnoccupiedError {
    pub(crate) fn probe(candidate: impl Into<String>, source: impl Into<ProbeError>) -> Self {
        Self::Probe {
            candidate: candidate.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_message_names_the_request() {
        let err = UnoccupiedNameNotFound::new("draft", 3);
        assert_eq!(
            err.to_string(),
            "no unoccupied name found for `draft` after 3 candidates"
        );
        assert_eq!(err.name(), "draft");
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn not_found_is_transparent() {
        let inner = UnoccupiedNameNotFound::new("draft", 3);
        let err = UnoccupiedError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn probe_error_chains_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = UnoccupiedError::probe("x_1", io);
        assert!(err.to_string().contains("x_1"));
        let source = err.source().expect("probe error has a source");
        assert!(source.to_string().starts_with("i/o: "));
        assert!(source.source().is_some());
    }

    #[test]
    fn invalid_name_chains_source() {
        let err = UnoccupiedError::from(InvalidName::Empty);
        assert_eq!(err.to_string(), "invalid: name cannot be empty");
        assert!(err.source().is_some());
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_normal<T: Sized + Send + Sync>() {}
        assert_normal::<UnoccupiedNameNotFound>();
        assert_normal::<ProbeError>();
        assert_normal::<UnoccupiedError>();
    }
}
