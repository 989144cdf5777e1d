//! Resumption token tracking
//!
//! Decides whether a list response has a continuation and extracts the token
//! and announced list size for the next request.

use crate::model::{Response, ResumptionToken};

/// Continuation state extracted from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resumption {
    /// Token for the next request; empty when the list is complete
    pub token: String,
    /// `completeListSize` announced with the token, 0 when unknown
    pub complete_list_size: u64,
}

impl Resumption {
    /// Returns true if another page must be requested
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Extracts the resumption state of a response
///
/// The ListIdentifiers token is preferred. If it is absent or empty the
/// ListRecords token is used, then the ListSets token. A response without any
/// non-empty token yields an empty token and a size of 0, so a size is only
/// ever reported together with the token it came from.
///
/// # Arguments
///
/// * `response` - The parsed response, or `None` if the page failed
///
/// # Example
///
/// ```
/// use oai_harvest::harvester::resumption::extract;
///
/// let done = extract(None);
/// assert!(!done.has_token());
/// assert_eq!(done.complete_list_size, 0);
/// ```
pub fn extract(response: Option<&Response>) -> Resumption {
    let Some(response) = response else {
        return Resumption::default();
    };

    response
        .resumption_tokens()
        .find(|token| !token.token.is_empty())
        .map(resumption_from)
        .unwrap_or_default()
}

fn resumption_from(token: &ResumptionToken) -> Resumption {
    Resumption {
        token: token.token.clone(),
        complete_list_size: token.complete_list_size.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListIdentifiers, ListRecords, ListSets};

    fn token(value: &str, size: u64) -> Option<ResumptionToken> {
        Some(ResumptionToken {
            token: value.to_string(),
            complete_list_size: Some(size),
            ..ResumptionToken::default()
        })
    }

    fn response(identifiers: Option<ResumptionToken>, records: Option<ResumptionToken>) -> Response {
        Response {
            list_identifiers: Some(ListIdentifiers {
                headers: vec![],
                resumption_token: identifiers,
            }),
            list_records: Some(ListRecords {
                records: vec![],
                resumption_token: records,
            }),
            ..Response::default()
        }
    }

    #[test]
    fn test_list_identifiers_takes_precedence() {
        let resumption = extract(Some(&response(token("T1", 100), token("T2", 200))));

        assert!(resumption.has_token());
        assert_eq!(resumption.token, "T1");
        assert_eq!(resumption.complete_list_size, 100);
    }

    #[test]
    fn test_falls_back_to_list_records() {
        let resumption = extract(Some(&response(token("", 100), token("T2", 200))));

        assert_eq!(resumption.token, "T2");
        assert_eq!(resumption.complete_list_size, 200);
    }

    #[test]
    fn test_neither_populated() {
        let resumption = extract(Some(&response(None, None)));
        assert_eq!(resumption, Resumption::default());
        assert!(!resumption.has_token());
    }

    #[test]
    fn test_empty_tokens_never_report_a_size() {
        let resumption = extract(Some(&response(token("", 100), token("", 200))));

        assert!(!resumption.has_token());
        assert_eq!(resumption.token, "");
        assert_eq!(resumption.complete_list_size, 0);
    }

    #[test]
    fn test_missing_response() {
        assert_eq!(extract(None), Resumption::default());
    }

    #[test]
    fn test_default_response() {
        assert!(!extract(Some(&Response::default())).has_token());
    }

    #[test]
    fn test_list_sets_token() {
        let response = Response {
            list_sets: Some(ListSets {
                sets: vec![],
                resumption_token: token("S1", 7),
            }),
            ..Response::default()
        };

        let resumption = extract(Some(&response));
        assert_eq!(resumption.token, "S1");
        assert_eq!(resumption.complete_list_size, 7);
    }

    #[test]
    fn test_token_without_size() {
        let response = Response {
            list_records: Some(ListRecords {
                records: vec![],
                resumption_token: Some(ResumptionToken {
                    token: "next".to_string(),
                    ..ResumptionToken::default()
                }),
            }),
            ..Response::default()
        };

        let resumption = extract(Some(&response));
        assert!(resumption.has_token());
        assert_eq!(resumption.complete_list_size, 0);
    }
}
