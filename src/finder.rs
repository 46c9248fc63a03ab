//! Strategies deciding which candidates exist and which are occupied.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, trace};

use crate::error::{ProbeError, UnoccupiedError, UnoccupiedNameNotFound};
use crate::numbering::Numbering;
use crate::validation::{self, InvalidName};

/// A source of candidates together with an occupancy test.
///
/// The search functions in this crate only talk to finders through this
/// trait, so new namespaces (a database table, a remote bucket, ...) plug in
/// by implementing it. The trait is object safe.
pub trait NameFinder {
    /// Reject names this finder can never produce candidates from.
    fn validate(&self, name: &str) -> Result<(), InvalidName> {
        validation::validate_name(name)
    }

    /// The candidate for `attempt`, or `None` once the sequence is exhausted.
    /// Attempt 0 is the requested name.
    fn candidate(&self, name: &str, attempt: u64) -> Option<String>;

    /// Whether `candidate` is already in use.
    fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError>;

    /// The form under which two names count as the same one.
    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }
}

/// Finds names that are missing from an in-memory set.
///
/// ```
/// use unoccupied::{unoccupied, NumberNameFinder};
///
/// let finder = NumberNameFinder::new(["page", "page_1"]);
/// assert_eq!(unoccupied("page", &finder).unwrap(), "page_2");
/// assert_eq!(unoccupied("chapter", &finder).unwrap(), "chapter");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NumberNameFinder {
    taken: HashSet<String>,
    // lowercase copy of `taken`, consulted under `ignore_case`
    folded: HashSet<String>,
    numbering: Numbering,
    ignore_case: bool,
}

impl NumberNameFinder {
    /// Create a finder treating every name in `taken` as occupied.
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut finder = Self::default();
        for name in taken {
            finder.insert(name);
        }
        finder
    }

    /// Replace the candidate spelling rules.
    #[must_use]
    pub fn with_numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// Compare names by their lowercase form.
    #[must_use]
    pub fn ignore_case(mut self, enabled: bool) -> Self {
        self.ignore_case = enabled;
        self
    }

    /// Mark `name` as occupied. Returns `false` if it already was.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let was_free = !self.contains(&name);
        self.folded.insert(name.to_lowercase());
        self.taken.insert(name);
        was_free
    }

    fn contains(&self, name: &str) -> bool {
        if self.ignore_case {
            self.folded.contains(&name.to_lowercase())
        } else {
            self.taken.contains(name)
        }
    }

    /// Number of distinct occupied names under the current comparison.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.ignore_case {
            self.folded.len()
        } else {
            self.taken.len()
        }
    }

    /// Whether no name is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

impl NameFinder for NumberNameFinder {
    fn candidate(&self, name: &str, attempt: u64) -> Option<String> {
        self.numbering.candidate(name, attempt)
    }

    fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError> {
        Ok(self.contains(candidate))
    }

    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.ignore_case {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }
}

/// Finds file names that do not exist yet inside a directory.
///
/// Numbers are inserted before the extension: `report.txt` becomes
/// `report_1.txt`. Any kind of entry counts as occupied, including
/// directories and dangling symlinks.
#[derive(Debug, Clone)]
pub struct FileNameFinder {
    dir: PathBuf,
    numbering: Numbering,
    portable: bool,
}

impl FileNameFinder {
    /// Create a finder probing entries of `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            numbering: Numbering::default(),
            portable: true,
        }
    }

    /// Replace the candidate spelling rules.
    #[must_use]
    pub fn with_numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// When enabled (the default), names Windows reserves for devices
    /// (`con`, `nul.txt`, `com1`, ...) count as occupied.
    #[must_use]
    pub fn portable(mut self, enabled: bool) -> Self {
        self.portable = enabled;
        self
    }

    /// The directory being probed.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Atomically create the first unoccupied file.
    ///
    /// Unlike probing and then creating, this cannot hand out a name another
    /// process grabbed in between.
    ///
    /// # Errors
    ///
    /// Fails like [`unoccupied`](crate::unoccupied), or with
    /// [`UnoccupiedError::Probe`] if creation fails for a reason other than
    /// the file already existing.
    pub fn create_file(&self, name: &str) -> Result<(PathBuf, File), UnoccupiedError> {
        self.claim(name, |path| {
            OpenOptions::new().write(true).create_new(true).open(path)
        })
    }

    /// Atomically create the first unoccupied directory.
    ///
    /// # Errors
    ///
    /// Same as [`create_file`](Self::create_file).
    pub fn create_dir(&self, name: &str) -> Result<PathBuf, UnoccupiedError> {
        self.claim(name, |path| fs::create_dir(path))
            .map(|(path, ())| path)
    }

    fn claim<T>(
        &self,
        name: &str,
        create: impl Fn(&Path) -> io::Result<T>,
    ) -> Result<(PathBuf, T), UnoccupiedError> {
        self.validate(name)?;

        let mut attempt = 0;
        while let Some(candidate) = self.candidate(name, attempt) {
            attempt += 1;
            if self.portable && validation::is_windows_reserved(&candidate) {
                trace!("skipping reserved device name {candidate:?}");
                continue;
            }
            let path = self.dir.join(&candidate);
            debug!("creating {}", path.display());
            match create(&path) {
                Ok(value) => {
                    info!("claimed {}", path.display());
                    return Ok((path, value));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!("{} already exists", path.display());
                }
                Err(e) => return Err(UnoccupiedError::probe(candidate, e)),
            }
        }
        Err(UnoccupiedNameNotFound::new(name, attempt).into())
    }
}

impl NameFinder for FileNameFinder {
    fn validate(&self, name: &str) -> Result<(), InvalidName> {
        validation::validate_file_name(name)
    }

    fn candidate(&self, name: &str, attempt: u64) -> Option<String> {
        let (stem, ext) = validation::split_extension(name);
        // numbering only ever lengthens the stem, so a name past the limit
        // ends the sequence
        self.numbering
            .candidate(stem, attempt)
            .map(|numbered| format!("{numbered}{ext}"))
            .filter(|candidate| candidate.len() <= validation::MAX_FILE_NAME_LENGTH)
    }

    fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError> {
        if self.portable && validation::is_windows_reserved(candidate) {
            return Ok(true);
        }
        match fs::symlink_metadata(self.dir.join(candidate)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Wraps a finder so that names handed out earlier also count as occupied.
///
/// `claimed` holds names in the form returned by [`NameFinder::key`] of the
/// wrapped finder.
#[derive(Debug)]
pub struct Excluding<'a, F: ?Sized> {
    inner: &'a F,
    claimed: &'a HashSet<String>,
}

impl<'a, F: NameFinder + ?Sized> Excluding<'a, F> {
    /// Treat everything in `claimed` as occupied on top of `inner`.
    pub fn new(inner: &'a F, claimed: &'a HashSet<String>) -> Self {
        Self { inner, claimed }
    }
}

impl<F: NameFinder + ?Sized> NameFinder for Excluding<'_, F> {
    fn validate(&self, name: &str) -> Result<(), InvalidName> {
        self.inner.validate(name)
    }

    fn candidate(&self, name: &str, attempt: u64) -> Option<String> {
        self.inner.candidate(name, attempt)
    }

    fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError> {
        if self.claimed.contains(self.inner.key(candidate).as_ref()) {
            return Ok(true);
        }
        self.inner.is_occupied(candidate)
    }

    fn key<'b>(&self, name: &'b str) -> Cow<'b, str> {
        self.inner.key(name)
    }
}
