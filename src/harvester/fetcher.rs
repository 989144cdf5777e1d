//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the shared HTTP client from configuration
//! - The [`Transport`] seam over one GET request
//! - Status and transport error classification
//! - Retry with exponential backoff around GET + parse

use crate::config::HttpConfig;
use crate::harvester::parser::parse_response;
use crate::model::Response;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum number of attempts per page (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Default cap on the delay between two attempts.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Status and body of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Response body; left empty for error statuses
    pub body: Vec<u8>,
}

/// One HTTP GET, without retries
///
/// Implementations report connection failures as [`HarvestError::Transport`],
/// an elapsed client deadline as [`HarvestError::Timeout`], and a body that
/// could not be read after the status line arrived as
/// [`HarvestError::BodyRead`]. Any status is returned as a reply; the retrier
/// classifies it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpReply, HarvestError>;
}

/// [`Transport`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the transport with a client configured from `config`
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Ok(HttpReply {
                status,
                body: Vec::new(),
            });
        }

        match response.bytes().await {
            Ok(body) => Ok(HttpReply {
                status,
                body: body.to_vec(),
            }),
            Err(e) => Err(HarvestError::BodyRead {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (timeouts, user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```
/// use oai_harvest::config::HttpConfig;
/// use oai_harvest::harvester::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest send error to a retryable transport failure
fn classify_request_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Classifies an HTTP status
///
/// | Status | Result |
/// |--------|--------|
/// | < 400 | Ok |
/// | 408 | Timeout (retryable) |
/// | other 4xx | Client (terminal) |
/// | >= 500 | Server (retryable) |
pub fn check_status(url: &str, status: u16) -> Result<(), HarvestError> {
    match status {
        500.. => Err(HarvestError::Server {
            url: url.to_string(),
            status,
        }),
        408 => Err(HarvestError::Timeout {
            url: url.to_string(),
        }),
        400..=499 => Err(HarvestError::Client {
            url: url.to_string(),
            status,
        }),
        _ => Ok(()),
    }
}

/// Bounded retry schedule with exponential backoff
///
/// The delay before retry `n` (1-indexed) is `initial_backoff * 2^(n-1)`,
/// capped at `max_backoff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy
    ///
    /// `max_attempts` is raised to at least 1 and `max_backoff` to at least
    /// `initial_backoff`.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay to wait before retry number `retry` (1-indexed)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Runs `attempt` until it succeeds, fails terminally, or the policy runs out
///
/// Retryable failures (see [`HarvestError::is_retryable`]) are logged and
/// retried after the scheduled delay. A terminal failure is returned at once.
/// When every attempt failed, the last cause is wrapped in
/// [`HarvestError::RetriesExhausted`].
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut attempt: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut number = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_retryable() => {
                tracing::debug!("Not retrying {}: {}", url, error);
                return Err(error);
            }
            Err(error) if number >= policy.max_attempts => {
                return Err(HarvestError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: number,
                    source: Box::new(error),
                });
            }
            Err(error) => {
                let delay = policy.delay_for(number);
                tracing::warn!(
                    "Attempt {}/{} failed ({}), retrying in {}ms",
                    number,
                    policy.max_attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                number += 1;
            }
        }
    }
}

/// GET + parse of one OAI-PMH URL under a retry policy
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches and parses one response
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - A success status with a parseable body
    /// * `Err(HarvestError)` - A terminal failure, or `RetriesExhausted`
    pub async fn fetch(&self, url: &str) -> Result<Response, HarvestError> {
        let transport = self.transport.as_ref();
        retry(&self.policy, url, || async move {
            let reply = transport.get(url).await?;
            check_status(url, reply.status)?;
            parse_response(&reply.body).map_err(|source| HarvestError::Parse {
                url: url.to_string(),
                source,
            })
        })
        .await
    }
}
