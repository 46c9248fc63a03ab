#![warn(missing_docs, missing_debug_implementations)]

//! Find an unoccupied name by probing numbered candidates.
//!
//! Starting from a requested name, a [`NameFinder`] spells out candidates
//! (`report.txt`, `report_1.txt`, `report_2.txt`, ... or `take07`, `take08`,
//! ...) and decides which ones are already in use. [`unoccupied`] returns the
//! first free one.
//!
//! Three finders ship with the crate:
//! - [`NumberNameFinder`] checks against an in-memory set of names.
//! - [`FileNameFinder`] checks entries of a directory, and can atomically
//!   create the file it found.
//! - [`http::HttpNameFinder`] treats a `404` from a URL template as free.
//!
//! # Example
//!
//! ```
//! use unoccupied::{unoccupied, NumberNameFinder, UnoccupiedError};
//!
//! let finder = NumberNameFinder::new(["draft", "draft_1"]);
//! match unoccupied("draft", &finder) {
//!     Ok(name) => assert_eq!(name, "draft_2"),
//!     Err(UnoccupiedError::NotFound(e)) => eprintln!("{e}"),
//!     Err(e) => eprintln!("error: {e}"),
//! }
//! ```

pub mod error;
pub mod finder;
pub mod http;
pub mod numbering;
pub mod report;
pub mod search;
pub mod validation;

pub use error::{ProbeError, UnoccupiedError, UnoccupiedNameNotFound};
pub use finder::{Excluding, FileNameFinder, NameFinder, NumberNameFinder};
pub use numbering::{DEFAULT_LIMIT, Numbering};
pub use search::{MAX_CONCURRENT_PROBES, unoccupied, unoccupied_concurrent};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
