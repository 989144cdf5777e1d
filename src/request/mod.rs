//! OAI-PMH request descriptors
//!
//! A [`Request`] names an endpoint, a verb and the arguments of one harvest.
//! Page one of a list harvest is selected by set, metadata prefix and date
//! bounds; every later page only by the resumption token of the page before.

mod query;
mod verb;

pub use query::build_url;
pub use verb::Verb;

use crate::harvester::Resumption;
use crate::model::Datestamp;
use crate::HarvestError;
use url::Url;

/// Descriptor of one harvest operation
///
/// Optional arguments hold `None` when absent; an empty string is treated the
/// same as `None` everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Endpoint URL, without query string
    pub base_url: String,
    pub verb: Option<Verb>,
    pub set: Option<String>,
    pub metadata_prefix: Option<String>,
    /// Record identifier for GetRecord and ListMetadataFormats
    pub identifier: Option<String>,
    pub resumption_token: Option<String>,
    /// Lower datestamp bound, `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ssZ`
    pub from: Option<String>,
    /// Upper datestamp bound, same granularity as `from`
    pub until: Option<String>,
    /// Complete list size last announced by the server (informational)
    pub complete_list_size: Option<u64>,
}

impl Request {
    /// Creates a request against the given endpoint with no arguments set
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_verb(mut self, verb: Verb) -> Self {
        self.verb = Some(verb);
        self
    }

    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }

    pub fn with_metadata_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_prefix = Some(prefix.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_resumption_token(mut self, token: impl Into<String>) -> Self {
        self.resumption_token = Some(token.into());
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_until(mut self, until: impl Into<String>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Returns the full query URL for this request
    pub fn url(&self) -> String {
        build_url(self)
    }

    /// Derives the request for the page following a resumption token
    ///
    /// The selector fields (set, metadata prefix, from, until) are cleared:
    /// OAI-PMH makes the resumption token an exclusive argument. The verb,
    /// endpoint and identifier carry over. A complete list size of 0 means the
    /// server announced none, and is stored as `None`.
    pub fn resume_with(&self, resumption: &Resumption) -> Self {
        Self {
            set: None,
            metadata_prefix: None,
            from: None,
            until: None,
            resumption_token: Some(resumption.token.clone()),
            complete_list_size: Some(resumption.complete_list_size).filter(|size| *size > 0),
            ..self.clone()
        }
    }

    /// Checks the endpoint URL and date bounds
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The request can be sent
    /// * `Err(HarvestError::InvalidRequest)` - The endpoint is not an absolute
    ///   http(s) URL, a date bound is not a valid datestamp, or the bounds are
    ///   reversed or of different granularity
    pub fn validate(&self) -> Result<(), HarvestError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            HarvestError::InvalidRequest(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(HarvestError::InvalidRequest(format!(
                "Base URL '{}' must use http or https",
                self.base_url
            )));
        }

        let from = parse_bound("from", self.from.as_deref())?;
        let until = parse_bound("until", self.until.as_deref())?;

        if let (Some(from), Some(until)) = (from, until) {
            if from.granularity() != until.granularity() {
                return Err(HarvestError::InvalidRequest(
                    "from and until must use the same granularity".to_string(),
                ));
            }
            if from > until {
                return Err(HarvestError::InvalidRequest(format!(
                    "from ({}) is later than until ({})",
                    from, until
                )));
            }
        }

        Ok(())
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<Datestamp>, HarvestError> {
    match value.filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => Datestamp::parse(value).map(Some).ok_or_else(|| {
            HarvestError::InvalidRequest(format!("Invalid {} datestamp: '{}'", name, value))
        }),
    }
}
