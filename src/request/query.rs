//! Request URL construction
//!
//! Turns a [`Request`] into the query URL of one verb invocation. Parameters
//! are emitted in a fixed order and only when they carry a non-empty value.

use crate::request::Request;
use url::form_urlencoded;

/// Builds the full query URL for a request
///
/// Parameter order is verb, set, metadataPrefix, resumptionToken, identifier,
/// from, until. Only the resumption token is percent-encoded; it is opaque to
/// the client and frequently contains reserved characters.
///
/// No verb/argument compatibility checks are done here.
///
/// # Example
///
/// ```
/// use oai_harvest::request::{build_url, Request, Verb};
///
/// let request = Request::new("http://example.org/oai")
///     .with_verb(Verb::ListRecords)
///     .with_metadata_prefix("oai_dc");
///
/// assert_eq!(
///     build_url(&request),
///     "http://example.org/oai?verb=ListRecords&metadataPrefix=oai_dc"
/// );
/// ```
pub fn build_url(request: &Request) -> String {
    let token = request.resumption_token.as_deref().map(encode_token);

    let mut params: Vec<String> = Vec::new();
    let mut add = |name: &str, value: Option<&str>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            params.push(format!("{}={}", name, value));
        }
    };

    add("verb", request.verb.map(|verb| verb.as_str()));
    add("set", request.set.as_deref());
    add("metadataPrefix", request.metadata_prefix.as_deref());
    add("resumptionToken", token.as_deref());
    add("identifier", request.identifier.as_deref());
    add("from", request.from.as_deref());
    add("until", request.until.as_deref());

    format!("{}?{}", request.base_url, params.join("&"))
}

/// Percent-encodes a resumption token using form encoding (space becomes `+`)
fn encode_token(token: &str) -> String {
    form_urlencoded::byte_serialize(token.as_bytes()).collect()
}
