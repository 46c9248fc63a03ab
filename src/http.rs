//! Probing names against an HTTP endpoint.
//!
//! A name is occupied when `GET <template with {name} replaced>` succeeds and
//! unoccupied when the server answers `404 Not Found`. Anything else (other
//! status codes, timeouts, DNS failures) is reported as a probe error rather
//! than guessed at.

use std::time::Duration;

use log::trace;
use thiserror::Error;
use ureq::Agent;

use crate::error::ProbeError;
use crate::finder::NameFinder;
use crate::numbering::Numbering;
use crate::validation::{self, InvalidName};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Placeholder substituted with each candidate in a URL template.
pub const PLACEHOLDER: &str = "{name}";

/// A URL template without a [`PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("url template `{0}` must contain a `{{name}}` placeholder")]
pub struct TemplateError(String);

/// Blocking HTTP client shared by every probe of an [`HttpNameFinder`].
///
/// Requests give up after ten seconds and identify themselves as
/// `unoccupied/<version>`. Cloning is cheap and reuses the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
}

impl Client {
    /// Build a client honouring the proxy settings of the environment.
    #[must_use]
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds names whose URL answers `404`.
///
/// ```no_run
/// use unoccupied::http::{Client, HttpNameFinder};
/// use unoccupied::unoccupied;
///
/// let finder = HttpNameFinder::new(Client::new(), "https://crates.io/api/v1/crates/{name}")?;
/// let name = unoccupied("serde", &finder)?;
/// println!("{name} is free");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpNameFinder {
    client: Client,
    template: String,
    numbering: Numbering,
}

impl HttpNameFinder {
    /// Create a finder probing `template` with `{name}` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template has no `{name}` placeholder.
    pub fn new(client: Client, template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(TemplateError(template));
        }
        Ok(Self {
            client,
            template,
            numbering: Numbering::default(),
        })
    }

    /// Replace the candidate spelling rules.
    #[must_use]
    pub fn with_numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// The URL probed for `candidate`.
    #[must_use]
    pub fn url_for(&self, candidate: &str) -> String {
        self.template.replace(PLACEHOLDER, candidate)
    }
}

impl NameFinder for HttpNameFinder {
    fn validate(&self, name: &str) -> Result<(), InvalidName> {
        validation::validate_url_segment(name)
    }

    fn candidate(&self, name: &str, attempt: u64) -> Option<String> {
        self.numbering.candidate(name, attempt)
    }

    fn is_occupied(&self, candidate: &str) -> Result<bool, ProbeError> {
        let url = self.url_for(candidate);
        trace!("GET {url}");
        match self.client.agent.get(&url).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            Err(e) => Err(Box::new(e).into()),
        }
    }
}
