//! Statistics gathered while a harvest runs
//!
//! This module accumulates per-page outcomes into totals that the binary
//! prints once a list harvest ends.

use crate::harvester::PageOutcome;
use crate::model::{Header, Response};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Pages fetched and parsed
    pub pages: u64,

    /// Pages that failed terminally (at most one per harvest)
    pub failed_pages: u64,

    /// Headers seen, whether bare or inside records
    pub headers: u64,

    /// Full records seen
    pub records: u64,

    /// Sets seen
    pub sets: u64,

    /// Headers flagged as deleted
    pub deleted: u64,

    /// Header count per set spec
    pub items_by_set: HashMap<String, u64>,

    /// OAI error codes and how often they were returned
    pub oai_errors: HashMap<String, u64>,

    /// Last complete list size the repository announced
    pub complete_list_size: Option<u64>,

    started: Instant,
}

impl Default for HarvestStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestStatistics {
    pub fn new() -> Self {
        Self {
            pages: 0,
            failed_pages: 0,
            headers: 0,
            records: 0,
            sets: 0,
            deleted: 0,
            items_by_set: HashMap::new(),
            oai_errors: HashMap::new(),
            complete_list_size: None,
            started: Instant::now(),
        }
    }

    /// Folds one page outcome into the totals
    pub fn observe(&mut self, outcome: PageOutcome<'_>) {
        match outcome {
            PageOutcome::Fetched(response) => self.observe_response(response),
            PageOutcome::Failed(_) => self.failed_pages += 1,
        }
    }

    /// Folds one parsed page into the totals
    ///
    /// The complete list size is read from the same token
    /// [`Response::resumption_tokens`] yields first, including a final empty
    /// token.
    pub fn observe_response(&mut self, response: &Response) {
        self.pages += 1;

        for error in &response.errors {
            *self.oai_errors.entry(error.code.clone()).or_insert(0) += 1;
        }

        for header in response.headers() {
            self.observe_header(header);
        }
        for record in response.records() {
            self.records += 1;
            self.observe_header(&record.header);
        }
        self.sets += response.sets().len() as u64;

        // An empty final token still carries the list size
        let token = response.resumption_tokens().next();
        if let Some(size) = token.and_then(|token| token.complete_list_size) {
            self.complete_list_size = Some(size);
        }
    }

    /// Counts a single header
    pub fn observe_header(&mut self, header: &Header) {
        self.headers += 1;
        if header.is_deleted() {
            self.deleted += 1;
        }
        for set_spec in &header.set_specs {
            *self.items_by_set.entry(set_spec.clone()).or_insert(0) += 1;
        }
    }

    /// Time since the statistics were created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages);
    if stats.failed_pages > 0 {
        println!("  Pages failed: {}", stats.failed_pages);
    }
    println!("  Headers: {}", stats.headers);
    if stats.records > 0 {
        println!("  Records: {}", stats.records);
    }
    if stats.sets > 0 {
        println!("  Sets: {}", stats.sets);
    }
    println!("  Deleted: {}", stats.deleted);
    if let Some(size) = stats.complete_list_size {
        println!("  Complete list size: {}", size);
    }
    println!("  Elapsed: {:.1}s", stats.elapsed().as_secs_f64());
    println!();

    if !stats.items_by_set.is_empty() {
        println!("Headers by Set:");
        // Sort sets by count (descending)
        let mut set_counts: Vec<_> = stats.items_by_set.iter().collect();
        set_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (set_spec, count) in set_counts {
            let percentage = if stats.headers > 0 {
                (*count as f64 / stats.headers as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", set_spec, count, percentage);
        }
        println!();
    }

    if !stats.oai_errors.is_empty() {
        println!("OAI Errors:");
        let mut error_counts: Vec<_> = stats.oai_errors.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (code, count) in error_counts {
            println!("  {}: {}", code, count);
        }
        println!();
    }
}
