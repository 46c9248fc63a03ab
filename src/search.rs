//! The probing loops.

use log::{debug, info};

use crate::error::{UnoccupiedError, UnoccupiedNameNotFound};
use crate::finder::NameFinder;

/// Maximum number of concurrent probes when searching with
/// [`unoccupied_concurrent`].
pub const MAX_CONCURRENT_PROBES: usize = 20;

/// Find the first unoccupied candidate for `name`.
///
/// Candidates are probed in order, starting with `name` itself.
///
/// # Errors
///
/// Returns [`UnoccupiedError::InvalidName`] if the finder rejects `name`,
/// [`UnoccupiedError::NotFound`] when every candidate is occupied, or
/// [`UnoccupiedError::Probe`] when a candidate cannot be checked.
///
/// # Example
///
/// ```
/// use unoccupied::{unoccupied, NumberNameFinder};
///
/// let finder = NumberNameFinder::new(["take07", "take08"]);
/// assert_eq!(unoccupied("take07", &finder).unwrap(), "take09");
/// ```
pub fn unoccupied<F>(name: &str, finder: &F) -> Result<String, UnoccupiedError>
where
    F: NameFinder + ?Sized,
{
    finder.validate(name)?;

    let mut attempt = 0;
    while let Some(candidate) = finder.candidate(name, attempt) {
        attempt += 1;
        debug!("probing {candidate:?}");
        match finder.is_occupied(&candidate) {
            Ok(true) => {}
            Ok(false) => {
                info!("{name:?} resolved to {candidate:?} after {attempt} probes");
                return Ok(candidate);
            }
            Err(e) => return Err(UnoccupiedError::probe(candidate, e)),
        }
    }
    Err(UnoccupiedNameNotFound::new(name, attempt).into())
}

/// Like [`unoccupied`], but probes up to `jobs` candidates at a time.
///
/// Returns exactly what [`unoccupied`] would: the lowest unoccupied
/// candidate wins, and a probe failure is only reported if no earlier
/// candidate in its window was free. Worth it when probes are slow, as with
/// [`HttpNameFinder`](crate::http::HttpNameFinder).
///
/// `jobs` is clamped to `1..=`[`MAX_CONCURRENT_PROBES`].
///
/// # Errors
///
/// Same as [`unoccupied`], plus [`UnoccupiedError::Internal`] if a probe
/// thread cannot be spawned or panics.
pub fn unoccupied_concurrent<F>(
    name: &str,
    finder: &F,
    jobs: usize,
) -> Result<String, UnoccupiedError>
where
    F: NameFinder + Sync + ?Sized,
{
    finder.validate(name)?;

    let jobs = jobs.clamp(1, MAX_CONCURRENT_PROBES) as u64;
    let mut attempt: u64 = 0;
    loop {
        let batch: Vec<String> = (attempt..attempt.saturating_add(jobs))
            .map_while(|a| finder.candidate(name, a))
            .collect();
        if batch.is_empty() {
            break;
        }
        debug!("probing {} candidates from attempt {attempt}", batch.len());

        let results = std::thread::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|candidate| {
                    std::thread::Builder::new()
                        .spawn_scoped(s, move || finder.is_occupied(candidate))
                })
                .collect();
            handles
                .into_iter()
                .map(|spawned| match spawned {
                    Ok(h) => h.join().map_err(|_| "panicked".to_owned()),
                    Err(e) => Err(format!("could not be spawned: {e}")),
                })
                .collect::<Vec<_>>()
        });

        let exhausted = (batch.len() as u64) < jobs;
        attempt += batch.len() as u64;

        for (candidate, result) in batch.into_iter().zip(results) {
            match result {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    info!("{name:?} resolved to {candidate:?}");
                    return Ok(candidate);
                }
                Ok(Err(e)) => return Err(UnoccupiedError::probe(candidate, e)),
                Err(why) => {
                    return Err(UnoccupiedError::Internal(format!(
                        "probe thread for {candidate:?} {why}"
                    )));
                }
            }
        }

        if exhausted {
            break;
        }
    }
    Err(UnoccupiedNameNotFound::new(name, attempt).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::finder::NumberNameFinder;
    use crate::numbering::Numbering;
    use crate::validation::InvalidName;

    /// Occupies every candidate below `free_from`; fails on `broken`.
    struct Scripted {
        numbering: Numbering,
        free_from: u64,
        broken: Option<u64>,
        panics: bool,
    }

    impl Scripted {
        fn new(free_from: u64) -> Self {
            Self {
                numbering: Numbering::default().increment_trailing(false),
                free_from,
                broken: None,
                panics: false,
            }
        }

        fn index(candidate: &str) -> u64 {
            candidate
                .rsplit_once('_')
                .map_or(0, |(_, n)| n.parse().unwrap())
        }
    }

    impl NameFinder for Scripted {
        fn candidate(&self, name: &str, attempt: u64) -> Option<String> {
            self.numbering.candidate(name, attempt)
        }

        fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError> {
            let idx = Self::index(candidate);
            if self.broken == Some(idx) {
                if self.panics {
                    panic!("scripted panic");
                }
                return Err(std::io::Error::other("scripted failure").into());
            }
            Ok(idx < self.free_from)
        }
    }

    #[test]
    fn free_name_is_returned_unchanged() {
        let finder = NumberNameFinder::default();
        assert_eq!(unoccupied("draft", &finder).unwrap(), "draft");
    }

    #[test]
    fn skips_occupied_candidates() {
        let finder = NumberNameFinder::new(["a", "a_1"]);
        assert_eq!(unoccupied("a", &finder).unwrap(), "a_2");
    }

    #[test]
    fn continues_trailing_numbers() {
        let finder = NumberNameFinder::new(["run07", "run08"]);
        assert_eq!(unoccupied("run07", &finder).unwrap(), "run09");
    }

    #[test]
    fn gaps_are_reused() {
        let finder = NumberNameFinder::new(["a", "a_2"]);
        assert_eq!(unoccupied("a", &finder).unwrap(), "a_1");
    }

    #[test]
    fn exhaustion_reports_attempts() {
        let finder = NumberNameFinder::new(["x", "x_1", "x_2"])
            .with_numbering(Numbering::default().with_limit(3));
        match unoccupied("x", &finder) {
            Err(UnoccupiedError::NotFound(e)) => {
                assert_eq!(e.name(), "x");
                assert_eq!(e.attempts(), 3);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn invalid_name_is_rejected_before_probing() {
        let finder = NumberNameFinder::default();
        assert!(matches!(
            unoccupied("", &finder),
            Err(UnoccupiedError::InvalidName(InvalidName::Empty))
        ));
    }

    #[test]
    fn probe_error_names_the_candidate() {
        let mut finder = Scripted::new(10);
        finder.broken = Some(2);
        match unoccupied("n", &finder) {
            Err(UnoccupiedError::Probe { candidate, .. }) => assert_eq!(candidate, "n_2"),
            other => panic!("expected Probe, got {other:?}"),
        }
    }

    #[test]
    fn works_through_trait_objects() {
        let finder: Box<dyn NameFinder + Sync> = Box::new(NumberNameFinder::new(["a"]));
        assert_eq!(unoccupied("a", finder.as_ref()).unwrap(), "a_1");
        assert_eq!(unoccupied_concurrent("a", finder.as_ref(), 4).unwrap(), "a_1");
    }

    #[test]
    fn concurrent_matches_sequential() {
        for free_from in [0, 1, 3, 4, 5, 17] {
            for jobs in [0, 1, 2, 4, 7] {
                let finder = Scripted::new(free_from);
                assert_eq!(
                    unoccupied_concurrent("n", &finder, jobs).unwrap(),
                    unoccupied("n", &finder).unwrap(),
                    "free_from={free_from} jobs={jobs}"
                );
            }
        }
    }

    #[test]
    fn concurrent_prefers_earlier_free_over_later_error() {
        let mut finder = Scripted::new(2);
        finder.broken = Some(3);
        assert_eq!(unoccupied_concurrent("n", &finder, 8).unwrap(), "n_2");
    }

    #[test]
    fn concurrent_reports_earlier_error() {
        let mut finder = Scripted::new(5);
        finder.broken = Some(1);
        match unoccupied_concurrent("n", &finder, 8) {
            Err(UnoccupiedError::Probe { candidate, .. }) => assert_eq!(candidate, "n_1"),
            other => panic!("expected Probe, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_exhaustion_counts_every_candidate() {
        let mut finder = Scripted::new(u64::MAX);
        finder.numbering = finder.numbering.clone().with_limit(10);
        match unoccupied_concurrent("n", &finder, 4) {
            Err(UnoccupiedError::NotFound(e)) => assert_eq!(e.attempts(), 10),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_huge_job_count_is_clamped() {
        let finder = Scripted::new(150);
        assert_eq!(
            unoccupied_concurrent("n", &finder, usize::MAX).unwrap(),
            "n_150"
        );

        let mut full = Scripted::new(u64::MAX);
        full.numbering = full.numbering.clone().with_limit(1_000);
        match unoccupied_concurrent("n", &full, 200_000) {
            Err(UnoccupiedError::NotFound(e)) => assert_eq!(e.attempts(), 1_000),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_panic_becomes_internal_error() {
        let mut finder = Scripted::new(5);
        finder.broken = Some(0);
        finder.panics = true;
        assert!(matches!(
            unoccupied_concurrent("n", &finder, 2),
            Err(UnoccupiedError::Internal(_))
        ));
    }
}
