//! Typed model of OAI-PMH responses
//!
//! Everything here is produced by the response parser and read-only afterwards.
//! Content whose schema depends on the repository (metadata, about,
//! descriptions) is kept as [`XmlFragment`] values.

mod datestamp;
mod fragment;
mod record;
mod response;

pub use datestamp::{Datestamp, Granularity};
pub use fragment::XmlFragment;
pub use record::{Header, Record};
pub use response::{
    GetRecord, Identify, ListIdentifiers, ListMetadataFormats, ListRecords, ListSets,
    MetadataFormat, OaiError, RequestEcho, Response, ResumptionToken, Set,
};
