//! Syntax rules for requested names.
//!
//! Each finder accepts a different alphabet: in-memory names only reject
//! control characters, file names follow the portable subset of POSIX rules,
//! and URL segments are restricted to RFC 3986 unreserved characters so they
//! can be substituted into a template without escaping.

use std::collections::HashSet;
use std::sync::LazyLock;

use thiserror::Error;

/// Longest file name (in bytes) accepted by [`validate_file_name`].
pub const MAX_FILE_NAME_LENGTH: usize = 255;

// Windows device names. Any file whose name before the first `.` matches one
// of these (case-insensitively) cannot be created on Windows.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "nul", "con", "prn", "aux", "com0", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt0", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8",
    "lpt9",
];

static WINDOWS_DEVICE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| WINDOWS_DEVICE_NAMES.iter().copied().collect());

/// A requested name that no finder could ever produce a candidate from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvalidName {
    /// The name is the empty string.
    #[error("name cannot be empty")]
    Empty,
    /// The name is longer than the target allows.
    #[error("name `{name}` is too long (max {max} bytes)")]
    TooLong {
        /// The offending name.
        name: String,
        /// The limit that was exceeded.
        max: usize,
    },
    /// The name is `.` or `..`.
    #[error("`{name}` refers to a directory, not an entry")]
    Dot {
        /// The offending name.
        name: String,
    },
    /// The name contains a character the target does not accept.
    #[error("invalid character {ch:?} in name `{name}`")]
    Char {
        /// The first rejected character.
        ch: char,
        /// The offending name.
        name: String,
    },
}

/// Accept any non-empty name without control characters.
///
/// ```
/// use unoccupied::validation::validate_name;
/// assert!(validate_name("draft").is_ok());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }
    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(InvalidName::Char {
            ch,
            name: name.into(),
        });
    }
    Ok(())
}

/// Accept a single path component that can be created inside a directory.
pub fn validate_file_name(name: &str) -> Result<(), InvalidName> {
    validate_name(name)?;

    if name.len() > MAX_FILE_NAME_LENGTH {
        return Err(InvalidName::TooLong {
            name: name.into(),
            max: MAX_FILE_NAME_LENGTH,
        });
    }
    if name == "." || name == ".." {
        return Err(InvalidName::Dot { name: name.into() });
    }
    if let Some(ch) = name.chars().find(|&c| c == '/' || c == '\0') {
        return Err(InvalidName::Char {
            ch,
            name: name.into(),
        });
    }
    Ok(())
}

/// Accept a name that can be pasted into a URL path as-is.
pub fn validate_url_segment(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }
    if name == "." || name == ".." {
        return Err(InvalidName::Dot { name: name.into() });
    }
    for ch in name.chars() {
        if !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~')) {
            return Err(InvalidName::Char {
                ch,
                name: name.into(),
            });
        }
    }
    Ok(())
}

/// Split a file name into stem and extension (the extension keeps its dot).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
///
/// ```
/// use unoccupied::validation::split_extension;
/// assert_eq!(split_extension("report.txt"), ("report", ".txt"));
/// assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Whether Windows would refuse to create a file with this name.
#[must_use]
pub fn is_windows_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name);
    WINDOWS_DEVICE_SET.contains(base.to_ascii_lowercase().as_str())
}
