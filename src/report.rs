//! One line of command-line output per requested name.

use std::fmt;

use serde::Serialize;

use crate::error::UnoccupiedError;

/// Outcome category of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Status {
    /// An unoccupied name was found.
    Found,
    /// Every candidate was occupied.
    NotFound,
    /// The requested name was rejected.
    Invalid,
    /// Probing failed.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found => write!(f, "found"),
            Self::NotFound => write!(f, "not-found"),
            Self::Invalid => write!(f, "invalid"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The result of resolving one requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The name as requested.
    pub requested: String,
    /// Outcome category.
    pub status: Status,
    /// The unoccupied name, when found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Why no name was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Build a report from a search result.
    #[must_use]
    pub fn new(requested: impl Into<String>, result: &Result<String, UnoccupiedError>) -> Self {
        let requested = requested.into();
        match result {
            Ok(name) => Self {
                requested,
                status: Status::Found,
                name: Some(name.clone()),
                error: None,
            },
            Err(e) => {
                let (status, message) = match e {
                    UnoccupiedError::InvalidName(inner) => (Status::Invalid, inner.to_string()),
                    UnoccupiedError::NotFound(inner) => (Status::NotFound, inner.to_string()),
                    other => (Status::Error, other.to_string()),
                };
                Self {
                    requested,
                    status,
                    name: None,
                    error: Some(message),
                }
            }
        }
    }

    /// Whether a name was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status == Status::Found
    }

    /// Tab-separated text form: `requested\tname` or
    /// `requested\tstatus: message`.
    #[must_use]
    pub fn to_line(&self) -> String {
        match (&self.name, &self.error) {
            (Some(name), _) => format!("{}\t{name}", self.requested),
            (None, Some(msg)) => format!("{}\t{}: {msg}", self.requested, self.status),
            (None, None) => format!("{}\t{}", self.requested, self.status),
        }
    }

    /// JSON form, one object without trailing newline.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
