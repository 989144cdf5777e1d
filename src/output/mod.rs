//! Output module for human-readable harvest results
//!
//! This module handles:
//! - Rendering parsed responses as plain-text summaries
//! - Recording and printing harvest statistics

pub mod stats;

pub use stats::{print_statistics, HarvestStatistics};

use crate::model::{Header, Identify, MetadataFormat, Record, Response, Set};
use std::fmt::Write;

/// Renders one header as a single line
///
/// Deleted headers are marked so they stand out in long listings.
pub fn format_header(header: &Header) -> String {
    let mut line = format!("{}  {}", header.datestamp, header.identifier);
    if !header.set_specs.is_empty() {
        let _ = write!(line, "  [{}]", header.set_specs.join(", "));
    }
    if header.is_deleted() {
        line.push_str("  (deleted)");
    }
    line
}

/// Renders a record as its header line followed by the metadata XML
pub fn format_record(record: &Record) -> String {
    let mut out = format_header(&record.header);
    if let Some(metadata) = &record.metadata {
        let _ = write!(out, "\n{}", metadata);
    }
    out
}

pub fn format_identify(identify: &Identify) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository: {}", identify.repository_name);
    let _ = writeln!(out, "Base URL: {}", identify.base_url);
    let _ = writeln!(out, "Protocol version: {}", identify.protocol_version);
    for email in &identify.admin_emails {
        let _ = writeln!(out, "Admin email: {}", email);
    }
    let _ = writeln!(out, "Earliest datestamp: {}", identify.earliest_datestamp);
    let _ = writeln!(out, "Deleted records: {}", identify.deleted_record);
    let _ = write!(out, "Granularity: {}", identify.granularity);
    out
}

pub fn format_metadata_format(format: &MetadataFormat) -> String {
    format!(
        "{}  {}  {}",
        format.metadata_prefix, format.metadata_namespace, format.schema
    )
}

pub fn format_set(set: &Set) -> String {
    format!("{}  {}", set.set_spec, set.set_name)
}

/// Renders everything a response carries, one item per line
///
/// OAI errors come first; a response with neither errors nor payload renders
/// as an empty string.
pub fn summarize_response(response: &Response) -> String {
    let mut lines: Vec<String> = Vec::new();

    for error in &response.errors {
        lines.push(format!("error {}: {}", error.code, error.message));
    }

    if let Some(identify) = &response.identify {
        lines.push(format_identify(identify));
    }
    if let Some(list) = &response.list_metadata_formats {
        lines.extend(list.formats.iter().map(format_metadata_format));
    }
    lines.extend(response.sets().iter().map(format_set));
    if let Some(record) = response.record() {
        lines.push(format_record(record));
    }
    lines.extend(response.headers().iter().map(format_header));
    lines.extend(response.records().iter().map(format_record));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::parse_response;

    fn header(identifier: &str, sets: &[&str], status: Option<&str>) -> Header {
        Header {
            status: status.map(str::to_string),
            identifier: identifier.to_string(),
            datestamp: "2021-03-04".to_string(),
            set_specs: sets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_header() {
        assert_eq!(
            format_header(&header("oai:x:1", &[], None)),
            "2021-03-04  oai:x:1"
        );
        assert_eq!(
            format_header(&header("oai:x:2", &["a", "b"], Some("deleted"))),
            "2021-03-04  oai:x:2  [a, b]  (deleted)"
        );
    }

    #[test]
    fn test_summarize_identify() {
        let response = parse_response(
            br#"<OAI-PMH><Identify>
                <repositoryName>Test Repo</repositoryName>
                <baseURL>http://example.org/oai</baseURL>
                <protocolVersion>2.0</protocolVersion>
                <adminEmail>admin@example.org</adminEmail>
                <earliestDatestamp>2000-01-01</earliestDatestamp>
                <deletedRecord>persistent</deletedRecord>
                <granularity>YYYY-MM-DD</granularity>
            </Identify></OAI-PMH>"#,
        )
        .unwrap();

        let summary = summarize_response(&response);

        assert!(summary.starts_with("Repository: Test Repo\n"));
        assert!(summary.contains("Admin email: admin@example.org"));
        assert!(summary.ends_with("Granularity: YYYY-MM-DD"));
    }

    #[test]
    fn test_summarize_error_and_sets() {
        let response = parse_response(
            br#"<OAI-PMH>
                <error code="badArgument">nope</error>
                <ListSets><set><setSpec>DTS</setSpec><setName>Dissertations</setName></set></ListSets>
            </OAI-PMH>"#,
        )
        .unwrap();

        assert_eq!(
            summarize_response(&response),
            "error badArgument: nope\nDTS  Dissertations"
        );
    }

    #[test]
    fn test_summarize_empty_response() {
        let response = parse_response(b"<OAI-PMH/>").unwrap();
        assert_eq!(summarize_response(&response), "");
    }
}
