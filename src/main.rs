//! oai-harvest main entry point
//!
//! This is the command-line interface for the OAI-PMH harvesting client.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use oai_harvest::config::{load_config, Config};
use oai_harvest::harvester::{load_response, WorkerPool};
use oai_harvest::output::{self, print_statistics, HarvestStatistics};
use oai_harvest::{Harvester, PageOutcome, Request, Verb};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// oai-harvest: an OAI-PMH metadata harvester
///
/// Issues OAI-PMH requests against a repository, follows resumption tokens
/// and prints what the repository returns.
#[derive(Parser, Debug)]
#[command(name = "oai-harvest")]
#[command(version)]
#[command(about = "An OAI-PMH metadata harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show repository information
    Identify(Endpoint),

    /// List the metadata formats a repository (or one item) supports
    ListMetadataFormats {
        #[command(flatten)]
        endpoint: Endpoint,

        #[arg(long)]
        identifier: Option<String>,
    },

    /// List the set structure of a repository
    ListSets(Endpoint),

    /// Fetch a single record
    GetRecord {
        #[command(flatten)]
        endpoint: Endpoint,

        #[arg(long)]
        identifier: String,

        #[arg(long)]
        metadata_prefix: String,
    },

    /// Harvest record headers
    ListIdentifiers {
        #[command(flatten)]
        endpoint: Endpoint,

        #[command(flatten)]
        selection: Selection,

        /// Spread headers over worker tasks (count from `[fan-out] workers`)
        #[arg(long)]
        fan_out: bool,

        /// Spread headers over this many worker tasks
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Harvest full records
    ListRecords {
        #[command(flatten)]
        endpoint: Endpoint,

        #[command(flatten)]
        selection: Selection,
    },

    /// Print a response previously saved to disk
    ShowFile {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Endpoint {
    /// Repository base URL
    #[arg(value_name = "BASE_URL")]
    base_url: String,
}

/// Selective harvesting arguments shared by the list commands
#[derive(Args, Debug)]
struct Selection {
    #[arg(long)]
    set: Option<String>,

    #[arg(long, default_value = "oai_dc")]
    metadata_prefix: String,

    /// Lower datestamp bound (YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ)
    #[arg(long)]
    from: Option<String>,

    /// Upper datestamp bound (YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ)
    #[arg(long)]
    until: Option<String>,
}

impl Selection {
    fn apply(self, mut request: Request) -> Request {
        request = request.with_metadata_prefix(self.metadata_prefix);
        if let Some(set) = self.set {
            request = request.with_set(set);
        }
        if let Some(from) = self.from {
            request = request.with_from(from);
        }
        if let Some(until) = self.until {
            request = request.with_until(until);
        }
        request
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::ShowFile { path } => handle_show_file(&path),
        command => {
            let harvester = Harvester::from_config(&config)?;
            handle_command(&harvester, &config, command).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("oai_harvest=info,warn"),
            1 => EnvFilter::new("oai_harvest=debug,info"),
            2 => EnvFilter::new("oai_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_command(
    harvester: &Harvester,
    config: &Config,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Identify(endpoint) => {
            let request = Request::new(endpoint.base_url).with_verb(Verb::Identify);
            handle_single(harvester, request).await
        }
        Command::ListMetadataFormats {
            endpoint,
            identifier,
        } => {
            let mut request = Request::new(endpoint.base_url).with_verb(Verb::ListMetadataFormats);
            if let Some(identifier) = identifier {
                request = request.with_identifier(identifier);
            }
            handle_single(harvester, request).await
        }
        Command::GetRecord {
            endpoint,
            identifier,
            metadata_prefix,
        } => {
            let request = Request::new(endpoint.base_url)
                .with_verb(Verb::GetRecord)
                .with_identifier(identifier)
                .with_metadata_prefix(metadata_prefix);
            handle_single(harvester, request).await
        }
        Command::ListSets(endpoint) => {
            let request = Request::new(endpoint.base_url).with_verb(Verb::ListSets);
            handle_list(harvester, request).await
        }
        Command::ListIdentifiers {
            endpoint,
            selection,
            fan_out,
            workers,
        } => {
            let request =
                selection.apply(Request::new(endpoint.base_url).with_verb(Verb::ListIdentifiers));
            match fan_out_workers(config, fan_out, workers) {
                Some(workers) => handle_fan_out(harvester, config, request, workers).await,
                None => handle_list(harvester, request).await,
            }
        }
        Command::ListRecords {
            endpoint,
            selection,
        } => {
            let request =
                selection.apply(Request::new(endpoint.base_url).with_verb(Verb::ListRecords));
            handle_list(harvester, request).await
        }
        Command::ShowFile { path } => handle_show_file(&path),
    }
}

/// Worker count for list-identifiers, or `None` to print sequentially
///
/// `--workers` wins; `--fan-out` alone takes the configured count.
fn fan_out_workers(config: &Config, fan_out: bool, workers: Option<usize>) -> Option<usize> {
    match workers {
        Some(workers) => Some(workers),
        None if fan_out => Some(config.fan_out.workers),
        None => None,
    }
}

/// Issues one request and prints the response
async fn handle_single(harvester: &Harvester, request: Request) -> anyhow::Result<()> {
    request.validate()?;
    let response = harvester.perform(&request).await?;

    let summary = output::summarize_response(&response);
    if !summary.is_empty() {
        println!("{}", summary);
    }
    Ok(())
}

/// Harvests every page of a list request, printing items as they arrive
async fn handle_list(harvester: &Harvester, request: Request) -> anyhow::Result<()> {
    request.validate()?;
    let mut stats = HarvestStatistics::new();

    let result = harvester
        .harvest(&request, |page| {
            if let PageOutcome::Fetched(response) = page {
                let summary = output::summarize_response(response);
                if !summary.is_empty() {
                    println!("{}", summary);
                }
            }
            stats.observe(page);
        })
        .await;

    println!();
    print_statistics(&stats);
    result?;
    Ok(())
}

/// Harvests headers and hands them to a pool of worker tasks
async fn handle_fan_out(
    harvester: &Harvester,
    config: &Config,
    request: Request,
    workers: usize,
) -> anyhow::Result<()> {
    request.validate()?;
    if workers == 0 {
        anyhow::bail!("--workers must be at least 1");
    }

    let pool = WorkerPool::spawn(workers, config.fan_out.channel_capacity, |worker, header| {
        println!("[{}] {}", worker, output::format_header(&header));
    });

    let result = harvester.fan_out_identifiers(&request, pool.senders()).await;
    let handled = pool.join().await?;
    let report = result?;

    println!();
    println!("=== Fan-out Statistics ===\n");
    println!("  Pages fetched: {}", report.pages);
    println!("  Headers: {}", report.items);
    if let Some(size) = report.complete_list_size {
        println!("  Complete list size: {}", size);
    }
    for (worker, count) in handled.iter().enumerate() {
        println!("  Worker {}: {} headers", worker, count);
    }
    Ok(())
}

/// Loads a saved response and prints it
fn handle_show_file(path: &std::path::Path) -> anyhow::Result<()> {
    let response = load_response(path)?;

    if let Some(date) = response.response_date() {
        println!("Response date: {}", date.to_rfc3339());
    }
    if let Some(verb) = &response.request.verb {
        println!("Verb: {}", verb);
    }
    let summary = output::summarize_response(&response);
    if !summary.is_empty() {
        println!("{}", summary);
    }
    Ok(())
}
