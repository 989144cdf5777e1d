//! Delivery adapters built on the page loop
//!
//! This module hands individual items to consumers instead of whole pages:
//! - Per-header and per-record callbacks, called synchronously in server order
//! - Round-robin fan-out of headers over bounded channels with a `None`
//!   completion sentinel
//! - A fixed pool of worker tasks draining those channels

use crate::harvester::engine::{HarvestReport, Harvester, PageOutcome};
use crate::model::{Header, Record};
use crate::request::{Request, Verb};
use crate::HarvestError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sending half of a fan-out channel; `None` signals the end of the harvest
pub type HeaderSender = mpsc::Sender<Option<Arc<Header>>>;

/// Receiving half of a fan-out channel
pub type HeaderReceiver = mpsc::Receiver<Option<Arc<Header>>>;

impl Harvester {
    /// Harvests all headers of a result set with ListIdentifiers
    ///
    /// The verb of `request` is replaced by `ListIdentifiers`. `on_header` is
    /// called once per header, in server order, before the next page is
    /// requested.
    pub async fn harvest_identifiers<F>(
        &self,
        request: &Request,
        mut on_header: F,
    ) -> Result<HarvestReport, HarvestError>
    where
        F: FnMut(&Header),
    {
        let request = request.clone().with_verb(Verb::ListIdentifiers);
        self.harvest(&request, |page| {
            if let PageOutcome::Fetched(response) = page {
                for header in response.headers() {
                    on_header(header);
                }
            }
        })
        .await
    }

    /// Harvests all records of a result set with ListRecords
    ///
    /// The verb of `request` is replaced by `ListRecords`. `on_record` is
    /// called once per record, in server order, before the next page is
    /// requested.
    pub async fn harvest_records<F>(
        &self,
        request: &Request,
        mut on_record: F,
    ) -> Result<HarvestReport, HarvestError>
    where
        F: FnMut(&Record),
    {
        let request = request.clone().with_verb(Verb::ListRecords);
        self.harvest(&request, |page| {
            if let PageOutcome::Fetched(response) = page {
                for record in response.records() {
                    on_record(record);
                }
            }
        })
        .await
    }

    /// Harvests all headers and spreads them over `channels`
    ///
    /// Within each page, header `i` goes to `channels[i % channels.len()]`, so
    /// every channel sees its headers in server order. Sends wait for channel
    /// capacity, which holds back the next page request. When the harvest
    /// ends, successfully or not, every channel receives one `None`.
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - All pages were distributed
    /// * `Err(HarvestError::InvalidRequest)` - `channels` is empty
    /// * `Err(HarvestError::ChannelClosed)` - A receiver was dropped early
    /// * `Err(HarvestError)` - A page failed
    pub async fn fan_out_identifiers(
        &self,
        request: &Request,
        channels: &[HeaderSender],
    ) -> Result<HarvestReport, HarvestError> {
        if channels.is_empty() {
            return Err(HarvestError::InvalidRequest(
                "fan-out needs at least one channel".to_string(),
            ));
        }

        let request = request.clone().with_verb(Verb::ListIdentifiers);
        let mut pages = self.pages(&request);

        let outcome = loop {
            let response = match pages.next_page().await {
                None => break Ok(()),
                Some(Ok(response)) => response,
                Some(Err(error)) => break Err(error),
            };

            let headers = response
                .list_identifiers
                .map(|list| list.headers)
                .unwrap_or_default();
            if let Err(error) = distribute(headers, channels).await {
                break Err(error);
            }
        };

        signal_done(channels).await;
        outcome.map(|()| pages.into_report())
    }
}

async fn distribute(headers: Vec<Header>, channels: &[HeaderSender]) -> Result<(), HarvestError> {
    for (i, header) in headers.into_iter().enumerate() {
        let index = i % channels.len();
        channels[index]
            .send(Some(Arc::new(header)))
            .await
            .map_err(|_| HarvestError::ChannelClosed { index })?;
    }
    Ok(())
}

async fn signal_done(channels: &[HeaderSender]) {
    for (index, channel) in channels.iter().enumerate() {
        if channel.send(None).await.is_err() {
            tracing::debug!("Channel {} closed before completion signal", index);
        }
    }
}

/// Fixed pool of tokio tasks, each draining one bounded fan-out channel
///
/// # Example
///
/// ```no_run
/// use oai_harvest::harvester::WorkerPool;
/// use oai_harvest::{Config, Harvester, Request};
///
/// # async fn example() -> oai_harvest::Result<()> {
/// let harvester = Harvester::from_config(&Config::default())?;
/// let pool = WorkerPool::spawn(4, 16, |worker, header| {
///     println!("worker {} got {}", worker, header.identifier);
/// });
///
/// let request = Request::new("http://example.org/oai").with_metadata_prefix("oai_dc");
/// harvester.fan_out_identifiers(&request, pool.senders()).await?;
/// let handled = pool.join().await?;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    senders: Vec<HeaderSender>,
    handles: Vec<JoinHandle<usize>>,
}

impl WorkerPool {
    /// Spawns `workers` tasks with channels of `capacity` slots each
    ///
    /// Both values are raised to at least 1. `handler` receives the worker
    /// index and the header. A worker stops at the first `None` or when its
    /// channel closes.
    pub fn spawn<F>(workers: usize, capacity: usize, handler: F) -> Self
    where
        F: Fn(usize, Arc<Header>) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let mut senders = Vec::new();
        let mut handles = Vec::new();

        for worker in 0..workers.max(1) {
            let (sender, mut receiver): (HeaderSender, HeaderReceiver) =
                mpsc::channel(capacity.max(1));
            let handler = Arc::clone(&handler);

            handles.push(tokio::spawn(async move {
                let mut handled = 0;
                while let Some(Some(header)) = receiver.recv().await {
                    (*handler)(worker, header);
                    handled += 1;
                }
                handled
            }));
            senders.push(sender);
        }

        Self { senders, handles }
    }

    /// Channels to pass to [`Harvester::fan_out_identifiers`]
    pub fn senders(&self) -> &[HeaderSender] {
        &self.senders
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to finish
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<usize>)` - Headers handled by each worker, by worker index
    /// * `Err(HarvestError::Worker)` - A worker panicked
    pub async fn join(self) -> Result<Vec<usize>, HarvestError> {
        let Self { senders, handles } = self;
        drop(senders);

        let mut handled = Vec::with_capacity(handles.len());
        for handle in handles {
            handled.push(
                handle
                    .await
                    .map_err(|e| HarvestError::Worker(e.to_string()))?,
            );
        }
        Ok(handled)
    }
}
