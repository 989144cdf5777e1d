/// OAI-PMH verb definitions
///
/// This module defines the six protocol verbs a harvester can issue.
use crate::HarvestError;
use std::fmt;
use std::str::FromStr;

/// An OAI-PMH verb, selecting both the request arguments and the response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Repository self-description
    Identify,

    /// Metadata formats available from the repository or for one item
    ListMetadataFormats,

    /// Set structure of the repository
    ListSets,

    /// One record by identifier and metadata prefix
    GetRecord,

    // ===== List Verbs =====
    /// Headers only, paginated with resumption tokens
    ListIdentifiers,

    /// Full records, paginated with resumption tokens
    ListRecords,
}

impl Verb {
    /// Returns the verb as it appears in the `verb` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::ListMetadataFormats => "ListMetadataFormats",
            Self::ListSets => "ListSets",
            Self::GetRecord => "GetRecord",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListRecords => "ListRecords",
        }
    }

    /// Returns true if responses to this verb can span several pages
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::ListIdentifiers | Self::ListRecords | Self::ListSets
        )
    }

    /// Returns all verbs
    pub fn all() -> [Self; 6] {
        [
            Self::Identify,
            Self::ListMetadataFormats,
            Self::ListSets,
            Self::GetRecord,
            Self::ListIdentifiers,
            Self::ListRecords,
        ]
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| HarvestError::InvalidRequest(format!("Unknown OAI-PMH verb: {}", s)))
    }
}
