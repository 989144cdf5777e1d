//! Harvest engine - page loop and resumption orchestration
//!
//! This module contains the loop that drives a harvest:
//! - Issuing the request for the current page
//! - Delivering the page (or its failure) to the caller
//! - Extracting the resumption token and deriving the next page request
//! - Stopping when no token remains or a page fails for good
//!
//! Pages are strictly sequential: the request for page N+1 is only known once
//! page N has been parsed.

use crate::config::{validate, Config};
use crate::harvester::fetcher::{Fetcher, ReqwestTransport, RetryPolicy, Transport};
use crate::harvester::resumption;
use crate::model::Response;
use crate::request::Request;
use crate::HarvestError;
use std::sync::Arc;

/// What the harvest delivers for each page
#[derive(Debug, Clone, Copy)]
pub enum PageOutcome<'a> {
    /// The page was fetched and parsed
    Fetched(&'a Response),

    /// The page failed terminally; no further pages follow
    Failed(&'a HarvestError),
}

impl<'a> PageOutcome<'a> {
    /// Returns the response of a fetched page
    pub fn response(&self) -> Option<&'a Response> {
        match self {
            Self::Fetched(response) => Some(response),
            Self::Failed(_) => None,
        }
    }
}

/// Summary of a finished harvest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Pages fetched and parsed successfully
    pub pages: usize,

    /// Headers, records and sets delivered across all pages
    pub items: usize,

    /// Last complete list size announced with a resumption token
    pub complete_list_size: Option<u64>,
}

/// OAI-PMH harvester
///
/// Holds the transport and retry policy. Cheap to clone; clones share the
/// underlying HTTP connection pool.
#[derive(Clone)]
pub struct Harvester {
    fetcher: Fetcher,
}

impl Harvester {
    /// Creates a harvester over an arbitrary transport
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            fetcher: Fetcher::new(transport, policy),
        }
    }

    /// Creates a reqwest-backed harvester from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Successfully built harvester
    /// * `Err(HarvestError::Config)` - The configuration is out of range
    /// * `Err(HarvestError::Http)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        validate(config)?;
        let transport = ReqwestTransport::from_config(&config.http)?;
        Ok(Self::new(Arc::new(transport), config.retry.policy()))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.fetcher.policy()
    }

    /// Performs a single request, without following resumption tokens
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - The parsed response, possibly carrying OAI errors
    /// * `Err(HarvestError)` - The request failed terminally or ran out of retries
    pub async fn perform(&self, request: &Request) -> Result<Response, HarvestError> {
        let url = request.url();
        tracing::debug!("Requesting {}", url);

        let response = self.fetcher.fetch(&url).await?;

        for error in &response.errors {
            if error.is_no_records_match() {
                tracing::debug!("No records match {}", url);
            } else {
                tracing::warn!(
                    "Repository error {} for {}: {}",
                    error.code,
                    url,
                    error.message
                );
            }
        }

        Ok(response)
    }

    /// Starts a page-by-page walk of the result set selected by `request`
    ///
    /// The caller's request is not modified.
    pub fn pages(&self, request: &Request) -> PageCursor<'_> {
        PageCursor {
            harvester: self,
            next: Some(request.clone()),
            report: HarvestReport::default(),
        }
    }

    /// Harvests a complete result set, delivering every page to `on_page`
    ///
    /// Each page is delivered before the next one is requested. A page that
    /// fails terminally is delivered as [`PageOutcome::Failed`] and its error
    /// is returned; no further pages are requested after it.
    ///
    /// # Arguments
    ///
    /// * `request` - The first page request
    /// * `on_page` - Called once per page, in order
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - The server stopped returning resumption tokens
    /// * `Err(HarvestError)` - A page failed
    pub async fn harvest<F>(
        &self,
        request: &Request,
        mut on_page: F,
    ) -> Result<HarvestReport, HarvestError>
    where
        F: FnMut(PageOutcome<'_>),
    {
        let mut pages = self.pages(request);

        while let Some(page) = pages.next_page().await {
            match page {
                Ok(response) => on_page(PageOutcome::Fetched(&response)),
                Err(error) => {
                    on_page(PageOutcome::Failed(&error));
                    return Err(error);
                }
            }
        }

        let report = pages.into_report();
        tracing::info!(
            "Harvest complete: {} pages, {} items",
            report.pages,
            report.items
        );
        Ok(report)
    }
}

/// Cursor over the pages of one harvest
///
/// Each call to [`PageCursor::next_page`] issues exactly one request (with
/// retries) and derives the next page request from the response's
/// resumption token.
pub struct PageCursor<'h> {
    harvester: &'h Harvester,
    next: Option<Request>,
    report: HarvestReport,
}

impl<'h> PageCursor<'h> {
    /// The request the next call to `next_page` will issue, if any
    pub fn next_request(&self) -> Option<&Request> {
        self.next.as_ref()
    }

    /// Fetches the next page
    ///
    /// # Returns
    ///
    /// * `Some(Ok(Response))` - A page was fetched
    /// * `Some(Err(HarvestError))` - The page failed; the cursor is now exhausted
    /// * `None` - The previous page carried no resumption token
    pub async fn next_page(&mut self) -> Option<Result<Response, HarvestError>> {
        let request = self.next.take()?;

        let response = match self.harvester.perform(&request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!("problem url: {} ({})", request.url(), error);
                return Some(Err(error));
            }
        };

        self.report.pages += 1;
        self.report.items +=
            response.headers().len() + response.records().len() + response.sets().len();

        let resumption = resumption::extract(Some(&response));
        if resumption.has_token() {
            tracing::debug!(
                "Following resumption token {} (complete list size {})",
                resumption.token,
                resumption.complete_list_size
            );
            if resumption.complete_list_size > 0 {
                self.report.complete_list_size = Some(resumption.complete_list_size);
            }
            self.next = Some(request.resume_with(&resumption));
        }

        Some(Ok(response))
    }

    pub fn report(&self) -> &HarvestReport {
        &self.report
    }

    pub fn into_report(self) -> HarvestReport {
        self.report
    }
}
