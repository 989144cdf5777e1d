//! Test doubles shared by the harvester unit tests

use crate::harvester::fetcher::{HttpReply, RetryPolicy, Transport};
use crate::HarvestError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport replaying a fixed list of replies and recording requested URLs
///
/// Once the script is exhausted every request gets a 404.
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, HarvestError>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Result<HttpReply, HarvestError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, HarvestError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| status(404))
    }
}

pub(crate) fn ok(body: &str) -> Result<HttpReply, HarvestError> {
    Ok(HttpReply {
        status: 200,
        body: body.as_bytes().to_vec(),
    })
}

pub(crate) fn status(code: u16) -> Result<HttpReply, HarvestError> {
    Ok(HttpReply {
        status: code,
        body: Vec::new(),
    })
}

/// Millisecond backoff so retry tests stay fast
pub(crate) fn test_policy() -> RetryPolicy {
    RetryPolicy::new(10, Duration::from_millis(1), Duration::from_millis(4))
}

fn token_element(token: Option<&str>, size: u64) -> String {
    match token {
        Some(token) => format!(
            r#"<resumptionToken completeListSize="{}">{}</resumptionToken>"#,
            size, token
        ),
        None => String::new(),
    }
}

pub(crate) fn list_identifiers_page(ids: &[&str], token: Option<&str>) -> String {
    let headers: String = ids
        .iter()
        .map(|id| {
            format!(
                "<header><identifier>{}</identifier><datestamp>2020-01-01</datestamp></header>",
                id
            )
        })
        .collect();
    format!(
        "<OAI-PMH><ListIdentifiers>{}{}</ListIdentifiers></OAI-PMH>",
        headers,
        token_element(token, 100)
    )
}

pub(crate) fn list_records_page(ids: &[&str], token: Option<&str>) -> String {
    let records: String = ids
        .iter()
        .map(|id| {
            format!(
                "<record><header><identifier>{}</identifier><datestamp>2020-01-01</datestamp></header>\
                 <metadata><title>{}</title></metadata></record>",
                id, id
            )
        })
        .collect();
    format!(
        "<OAI-PMH><ListRecords>{}{}</ListRecords></OAI-PMH>",
        records,
        token_element(token, 100)
    )
}
