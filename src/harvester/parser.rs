//! OAI-PMH response parser
//!
//! This module turns response bytes into the typed [`Response`] model. It walks
//! the document with quick-xml's pull reader and matches elements by local
//! name, so both default-namespace and prefixed (`oai:`) documents parse.
//! Repository-specific content is captured verbatim as [`XmlFragment`]s.

use crate::model::{
    GetRecord, Header, Identify, ListIdentifiers, ListMetadataFormats, ListRecords, ListSets,
    MetadataFormat, OaiError, Record, RequestEcho, Response, ResumptionToken, Set, XmlFragment,
};
use crate::{HarvestError, ParseError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::path::Path;

type XmlReader<'a> = Reader<&'a [u8]>;

/// Parses an OAI-PMH response document
///
/// The root element name is not checked. Unknown elements are skipped.
///
/// # Arguments
///
/// * `bytes` - The UTF-8 encoded response body
///
/// # Returns
///
/// * `Ok(Response)` - Successfully parsed response
/// * `Err(ParseError)` - The body is not well-formed XML, not UTF-8, or has an
///   invalid integer attribute
///
/// # Example
///
/// ```
/// use oai_harvest::harvester::parse_response;
///
/// let xml = br#"<OAI-PMH><responseDate>2002-02-08T12:00:01Z</responseDate>
///   <ListIdentifiers>
///     <header><identifier>oai:a:1</identifier><datestamp>2002-01-01</datestamp></header>
///     <resumptionToken completeListSize="2">next</resumptionToken>
///   </ListIdentifiers></OAI-PMH>"#;
///
/// let response = parse_response(xml).unwrap();
/// assert_eq!(response.headers()[0].identifier, "oai:a:1");
/// ```
pub fn parse_response(bytes: &[u8]) -> Result<Response, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let root = loop {
        match reader.read_event()? {
            Event::Start(start) => break Element { start, empty: false },
            Event::Empty(start) => break Element { start, empty: true },
            Event::Eof => return Err(ParseError::MissingRoot),
            _ => {}
        }
    };

    let mut response = Response::default();
    root.children(&mut reader, |reader, child| {
        match child.name() {
            b"responseDate" => response.response_date = child.text(reader)?,
            b"request" => response.request = parse_request_echo(reader, child)?,
            b"error" => response.errors.push(OaiError {
                code: child.attribute(b"code")?.unwrap_or_default(),
                message: child.text(reader)?,
            }),
            b"Identify" => response.identify = Some(parse_identify(reader, child)?),
            b"ListMetadataFormats" => {
                response.list_metadata_formats = Some(parse_list_metadata_formats(reader, child)?)
            }
            b"ListSets" => response.list_sets = Some(parse_list_sets(reader, child)?),
            b"GetRecord" => response.get_record = Some(parse_get_record(reader, child)?),
            b"ListIdentifiers" => {
                response.list_identifiers = Some(parse_list_identifiers(reader, child)?)
            }
            b"ListRecords" => response.list_records = Some(parse_list_records(reader, child)?),
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(response)
}

/// Loads a persisted OAI-PMH response from a file
///
/// # Returns
///
/// * `Ok(Response)` - Successfully read and parsed response
/// * `Err(HarvestError::Io)` - The file could not be read
/// * `Err(HarvestError::Parse)` - The file is not a valid response document
pub fn load_response(path: &Path) -> Result<Response, HarvestError> {
    let bytes = std::fs::read(path)?;
    parse_response(&bytes).map_err(|source| HarvestError::Parse {
        url: path.display().to_string(),
        source,
    })
}

/// An element whose start tag has been read
struct Element<'a> {
    start: BytesStart<'a>,
    /// Self-closing: there is no content and no end tag to consume
    empty: bool,
}

impl<'a> Element<'a> {
    fn name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    fn attribute(&self, name: &[u8]) -> Result<Option<String>, ParseError> {
        for attribute in self.start.attributes() {
            let attribute = attribute?;
            if attribute.key.local_name().as_ref() == name {
                return Ok(Some(attribute.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    /// Reads a count attribute
    ///
    /// Negative values mean "unknown" and read as `None`; anything that is not
    /// an integer is an error.
    fn number_attribute(&self, name: &'static str) -> Result<Option<u64>, ParseError> {
        let Some(value) = self.attribute(name.as_bytes())? else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if let Ok(number) = value.parse::<u64>() {
            return Ok(Some(number));
        }
        match value.parse::<i64>() {
            Ok(_) => {
                tracing::debug!("Ignoring negative {}: {}", name, value);
                Ok(None)
            }
            Err(_) => Err(ParseError::InvalidNumber {
                field: name,
                value: value.to_string(),
            }),
        }
    }

    /// Reads an informational count attribute, dropping values that do not parse
    fn lenient_number_attribute(&self, name: &'static str) -> Result<Option<u64>, ParseError> {
        match self.number_attribute(name) {
            Err(ParseError::InvalidNumber { field, value }) => {
                tracing::debug!("Ignoring unparseable {}: {}", field, value);
                Ok(None)
            }
            other => other,
        }
    }

    /// Reads the direct character data of the element, trimmed
    ///
    /// Text inside nested elements is ignored.
    fn text(&self, reader: &mut XmlReader<'a>) -> Result<String, ParseError> {
        if self.empty {
            return Ok(String::new());
        }

        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match reader.read_event()? {
                Event::Text(t) if depth == 0 => text.push_str(&t.unescape()?),
                Event::CData(c) if depth == 0 => text.push_str(std::str::from_utf8(&c)?),
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => break,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(ParseError::UnexpectedEof),
                _ => {}
            }
        }

        Ok(text.trim().to_string())
    }

    /// Reads the element content verbatim, markup included
    fn raw(&self, reader: &mut XmlReader<'a>) -> Result<Cow<'a, str>, ParseError> {
        if self.empty {
            return Ok(Cow::Borrowed(""));
        }
        Ok(reader.read_text(self.start.name())?)
    }

    fn fragment(&self, reader: &mut XmlReader<'a>) -> Result<XmlFragment, ParseError> {
        Ok(XmlFragment::new(self.raw(reader)?.as_bytes()))
    }

    fn skip(&self, reader: &mut XmlReader<'a>) -> Result<(), ParseError> {
        if !self.empty {
            reader.read_to_end(self.start.name())?;
        }
        Ok(())
    }

    /// Visits each child element; the visitor must consume or skip the child
    fn children<F>(&self, reader: &mut XmlReader<'a>, visit: F) -> Result<(), ParseError>
    where
        F: FnMut(&mut XmlReader<'a>, &Element<'a>) -> Result<(), ParseError>,
    {
        if self.empty {
            return Ok(());
        }
        walk(reader, false, visit)
    }
}

/// Visits sibling elements until the enclosing end tag, or until the end of
/// input for a bare fragment
fn walk<'a, F>(reader: &mut XmlReader<'a>, until_eof: bool, mut visit: F) -> Result<(), ParseError>
where
    F: FnMut(&mut XmlReader<'a>, &Element<'a>) -> Result<(), ParseError>,
{
    loop {
        let element = match reader.read_event()? {
            Event::Start(start) => Element { start, empty: false },
            Event::Empty(start) => Element { start, empty: true },
            Event::End(_) if !until_eof => return Ok(()),
            Event::Eof if until_eof => return Ok(()),
            Event::Eof => return Err(ParseError::UnexpectedEof),
            _ => continue,
        };
        visit(reader, &element)?;
    }
}

fn parse_request_echo<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<RequestEcho, ParseError> {
    Ok(RequestEcho {
        verb: element.attribute(b"verb")?,
        set: element.attribute(b"set")?,
        metadata_prefix: element.attribute(b"metadataPrefix")?,
        identifier: element.attribute(b"identifier")?,
        resumption_token: element.attribute(b"resumptionToken")?,
        from: element.attribute(b"from")?,
        until: element.attribute(b"until")?,
        base_url: element.text(reader)?,
    })
}

fn parse_resumption_token<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<ResumptionToken, ParseError> {
    Ok(ResumptionToken {
        complete_list_size: element.number_attribute("completeListSize")?,
        cursor: element.lenient_number_attribute("cursor")?,
        expiration_date: element.attribute(b"expirationDate")?,
        token: element.text(reader)?,
    })
}

fn parse_header<'a>(reader: &mut XmlReader<'a>, element: &Element<'a>) -> Result<Header, ParseError> {
    let mut header = Header {
        status: element.attribute(b"status")?,
        ..Header::default()
    };

    element.children(reader, |reader, child| {
        match child.name() {
            b"identifier" => header.identifier = child.text(reader)?,
            b"datestamp" => header.datestamp = child.text(reader)?,
            b"setSpec" => header.set_specs.push(child.text(reader)?),
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(header)
}

/// Parses a `<record>`, keeping its inner XML as the raw fragment
///
/// The record body is read verbatim first and then parsed on its own, so the
/// raw bytes are exactly what the server sent.
fn parse_record<'a>(reader: &mut XmlReader<'a>, element: &Element<'a>) -> Result<Record, ParseError> {
    let raw = element.raw(reader)?;
    let mut record = Record {
        raw: XmlFragment::new(raw.as_bytes()),
        ..Record::default()
    };

    let mut inner = Reader::from_str(&raw);
    inner.trim_text(true);
    walk(&mut inner, true, |inner, child| {
        match child.name() {
            b"header" => record.header = parse_header(inner, child)?,
            b"metadata" => record.metadata = Some(child.fragment(inner)?),
            b"about" => record.about = Some(child.fragment(inner)?),
            _ => child.skip(inner)?,
        }
        Ok(())
    })?;

    Ok(record)
}

fn parse_identify<'a>(reader: &mut XmlReader<'a>, element: &Element<'a>) -> Result<Identify, ParseError> {
    let mut identify = Identify::default();

    element.children(reader, |reader, child| {
        match child.name() {
            b"repositoryName" => identify.repository_name = child.text(reader)?,
            b"baseURL" => identify.base_url = child.text(reader)?,
            b"protocolVersion" => identify.protocol_version = child.text(reader)?,
            b"adminEmail" => identify.admin_emails.push(child.text(reader)?),
            b"earliestDatestamp" => identify.earliest_datestamp = child.text(reader)?,
            b"deletedRecord" => identify.deleted_record = child.text(reader)?,
            b"granularity" => identify.granularity = child.text(reader)?,
            b"description" => identify.descriptions.push(child.fragment(reader)?),
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(identify)
}

fn parse_list_metadata_formats<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<ListMetadataFormats, ParseError> {
    let mut list = ListMetadataFormats::default();

    element.children(reader, |reader, child| {
        if child.name() != b"metadataFormat" {
            return child.skip(reader);
        }

        let mut format = MetadataFormat::default();
        child.children(reader, |reader, field| {
            match field.name() {
                b"metadataPrefix" => format.metadata_prefix = field.text(reader)?,
                b"schema" => format.schema = field.text(reader)?,
                b"metadataNamespace" => format.metadata_namespace = field.text(reader)?,
                _ => field.skip(reader)?,
            }
            Ok(())
        })?;
        list.formats.push(format);
        Ok(())
    })?;

    Ok(list)
}

fn parse_list_sets<'a>(reader: &mut XmlReader<'a>, element: &Element<'a>) -> Result<ListSets, ParseError> {
    let mut list = ListSets::default();

    element.children(reader, |reader, child| {
        match child.name() {
            b"set" => {
                let mut set = Set::default();
                child.children(reader, |reader, field| {
                    match field.name() {
                        b"setSpec" => set.set_spec = field.text(reader)?,
                        b"setName" => set.set_name = field.text(reader)?,
                        b"setDescription" => set.set_description = Some(field.fragment(reader)?),
                        _ => field.skip(reader)?,
                    }
                    Ok(())
                })?;
                list.sets.push(set);
            }
            b"resumptionToken" => {
                list.resumption_token = Some(parse_resumption_token(reader, child)?)
            }
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(list)
}

fn parse_get_record<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<GetRecord, ParseError> {
    let mut get_record = GetRecord::default();

    element.children(reader, |reader, child| {
        match child.name() {
            b"record" => get_record.record = Some(parse_record(reader, child)?),
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(get_record)
}

fn parse_list_identifiers<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<ListIdentifiers, ParseError> {
    let mut list = ListIdentifiers::default();

    element.children(reader, |reader, child| {
        match child.name() {
            b"header" => list.headers.push(parse_header(reader, child)?),
            b"resumptionToken" => {
                list.resumption_token = Some(parse_resumption_token(reader, child)?)
            }
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(list)
}

fn parse_list_records<'a>(
    reader: &mut XmlReader<'a>,
    element: &Element<'a>,
) -> Result<ListRecords, ParseError> {
    let mut list = ListRecords::default();

    element.children(reader, |reader, child| {
        match child.name() {
            b"record" => list.records.push(parse_record(reader, child)?),
            b"resumptionToken" => {
                list.resumption_token = Some(parse_resumption_token(reader, child)?)
            }
            _ => child.skip(reader)?,
        }
        Ok(())
    })?;

    Ok(list)
}
