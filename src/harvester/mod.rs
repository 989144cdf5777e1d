//! Harvester module for OAI-PMH page fetching and delivery
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - XML response parsing
//! - Resumption token tracking
//! - The page loop and its delivery adapters

mod delivery;
mod engine;
mod fetcher;
mod parser;
pub mod resumption;

#[cfg(test)]
mod testing;

pub use delivery::{HeaderReceiver, HeaderSender, WorkerPool};
pub use engine::{HarvestReport, Harvester, PageCursor, PageOutcome};
pub use fetcher::{
    build_http_client, check_status, retry, Fetcher, HttpReply, ReqwestTransport, RetryPolicy,
    Transport, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF,
};
pub use parser::{load_response, parse_response};
pub use resumption::Resumption;
