//! oai-harvest: an OAI-PMH metadata harvesting client
//!
//! This crate builds OAI-PMH request URLs, fetches them with retry and backoff,
//! parses the XML responses into a typed model and follows resumption tokens
//! until a result set is exhausted.

pub mod config;
pub mod harvester;
pub mod model;
pub mod output;
pub mod request;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Server error {status} for {url}")]
    Server { url: String, status: u16 },

    #[error("Client error {status} for {url}")]
    Client { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {message}")]
    BodyRead { url: String, message: String },

    #[error("Invalid OAI-PMH response from {url}: {source}")]
    Parse { url: String, source: ParseError },

    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        source: Box<HarvestError>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Delivery channel {index} closed")]
    ChannelClosed { index: usize },

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if another attempt at the same URL may succeed
    ///
    /// Server errors, timeouts and connection failures are transient. Client
    /// errors, unreadable bodies after a successful status and parse failures
    /// are terminal: the server answered and repeating the request will not
    /// change that answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Server { .. }
        )
    }

    /// Returns the request URL this error is about, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. }
            | Self::Timeout { url }
            | Self::Server { url, .. }
            | Self::Client { url, .. }
            | Self::BodyRead { url, .. }
            | Self::Parse { url, .. }
            | Self::RetriesExhausted { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// XML response parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Response is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Invalid integer in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Unexpected end of document")]
    UnexpectedEof,

    #[error("Document has no root element")]
    MissingRoot,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{HarvestReport, Harvester, PageOutcome};
pub use model::{Header, Record, Response, XmlFragment};
pub use request::{Request, Verb};
