use crate::model::{Granularity, Header, Record, XmlFragment};
use chrono::{DateTime, Utc};

/// Echo of the request the repository answered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEcho {
    pub verb: Option<String>,
    pub set: Option<String>,
    pub metadata_prefix: Option<String>,
    pub identifier: Option<String>,
    pub resumption_token: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
    /// Text content: the base URL of the repository
    pub base_url: String,
}

/// A protocol-level error reported inside a 200 response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OaiError {
    pub code: String,
    pub message: String,
}

impl OaiError {
    /// Returns true for `noRecordsMatch`, which only means the result set is empty
    pub fn is_no_records_match(&self) -> bool {
        self.code == "noRecordsMatch"
    }
}

/// Continuation cursor of a partial list response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumptionToken {
    /// Token text; empty on the last page of a list
    pub token: String,
    pub complete_list_size: Option<u64>,
    pub cursor: Option<u64>,
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identify {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: String,
    pub admin_emails: Vec<String>,
    pub earliest_datestamp: String,
    /// `no`, `transient` or `persistent`
    pub deleted_record: String,
    pub granularity: String,
    pub descriptions: Vec<XmlFragment>,
}

impl Identify {
    pub fn datestamp_granularity(&self) -> Option<Granularity> {
        Granularity::from_identify(&self.granularity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFormat {
    pub metadata_prefix: String,
    pub schema: String,
    pub metadata_namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMetadataFormats {
    pub formats: Vec<MetadataFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set {
    pub set_spec: String,
    pub set_name: String,
    pub set_description: Option<XmlFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSets {
    pub sets: Vec<Set>,
    pub resumption_token: Option<ResumptionToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRecord {
    pub record: Option<Record>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIdentifiers {
    pub headers: Vec<Header>,
    pub resumption_token: Option<ResumptionToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecords {
    pub records: Vec<Record>,
    pub resumption_token: Option<ResumptionToken>,
}

/// Parsed OAI-PMH response document
///
/// At most one verb payload is present in a well-formed response. A response
/// carrying only errors has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub response_date: String,
    pub request: RequestEcho,
    pub errors: Vec<OaiError>,

    pub identify: Option<Identify>,
    pub list_metadata_formats: Option<ListMetadataFormats>,
    pub list_sets: Option<ListSets>,
    pub get_record: Option<GetRecord>,
    pub list_identifiers: Option<ListIdentifiers>,
    pub list_records: Option<ListRecords>,
}

impl Response {
    /// Headers of a ListIdentifiers payload, empty if there is none
    pub fn headers(&self) -> &[Header] {
        self.list_identifiers
            .as_ref()
            .map(|list| list.headers.as_slice())
            .unwrap_or_default()
    }

    /// Records of a ListRecords payload, empty if there is none
    pub fn records(&self) -> &[Record] {
        self.list_records
            .as_ref()
            .map(|list| list.records.as_slice())
            .unwrap_or_default()
    }

    /// Sets of a ListSets payload, empty if there is none
    pub fn sets(&self) -> &[Set] {
        self.list_sets
            .as_ref()
            .map(|list| list.sets.as_slice())
            .unwrap_or_default()
    }

    /// The record of a GetRecord payload
    pub fn record(&self) -> Option<&Record> {
        self.get_record.as_ref().and_then(|get| get.record.as_ref())
    }

    /// Resumption tokens present in the response, in lookup order
    ///
    /// ListIdentifiers comes first, then ListRecords, then ListSets. Empty
    /// tokens are included.
    pub fn resumption_tokens(&self) -> impl Iterator<Item = &ResumptionToken> {
        [
            self.list_identifiers
                .as_ref()
                .and_then(|list| list.resumption_token.as_ref()),
            self.list_records
                .as_ref()
                .and_then(|list| list.resumption_token.as_ref()),
            self.list_sets
                .as_ref()
                .and_then(|list| list.resumption_token.as_ref()),
        ]
        .into_iter()
        .flatten()
    }

    /// The first protocol error, if the repository reported any
    pub fn error(&self) -> Option<&OaiError> {
        self.errors.first()
    }

    /// Parses `responseDate`
    pub fn response_date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.response_date.trim())
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}
