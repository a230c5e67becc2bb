// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse and validate command-line arguments
// 2. Install logging (stderr) and a Ctrl-C handler
// 3. Crawl from the seed until a page contains the query
// 4. Re-check the found page with a fresh request
// 5. Print the result plus statistics and exit:
//    0 = found, 1 = not found, 2 = error or interrupted
// =============================================================================

mod assess;
mod cli;
mod config;
mod crawl;
mod memory;
mod scout;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use assess::Verifier;
use cli::Cli;
use config::Settings;
use crawl::{CrawlError, Crawler, Strategy};
use memory::Statistics;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only carries the result.
// RUST_LOG overrides the default level (info).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Everything the user gets to see at the end of a run
#[derive(Debug, Serialize)]
struct Outcome {
    query: String,
    seed: Url,
    strategy: Strategy,
    found: Option<Url>,
    /// None if there was nothing to verify or verification was skipped
    verified: Option<bool>,
    interrupted: bool,
    elapsed_ms: u64,
    statistics: Statistics,
}

async fn run() -> Result<i32> {
    let settings = Settings::from_cli(Cli::parse())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        "🔬 query-crawler"
    );
    info!(query = %settings.query, hosts = ?settings.host_patterns, "🔎");

    let abort = CancellationToken::new();
    abort_on_ctrl_c(abort.clone());

    let crawler = Crawler::new(settings.relevance.clone(), settings.strategy, settings.timeout)?;

    let started = Instant::now();
    let (found, interrupted) = match crawler.dig(settings.seed.clone(), &settings.query, &abort).await {
        Ok(found) => (found, false),
        Err(CrawlError::Interrupted) => {
            warn!("⛔ crawl interrupted, no result reported");
            (None, true)
        }
    };
    let elapsed = started.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        sources = crawler.memory().size(),
        "🏁 sources crawled"
    );

    let verified = match &found {
        Some(uri) if settings.verify => {
            let verifier = Verifier::new(settings.timeout)?;
            Some(verifier.verify(uri, &settings.query).await)
        }
        _ => None,
    };

    let outcome = Outcome {
        query: settings.query,
        seed: settings.seed,
        strategy: settings.strategy,
        found,
        verified,
        interrupted,
        elapsed_ms: elapsed.as_millis() as u64,
        statistics: crawler.memory().statistics(),
    };
    print_outcome(&outcome, settings.json)?;

    Ok(match (&outcome.found, outcome.interrupted) {
        (Some(_), _) => 0,
        (None, false) => 1,
        (None, true) => 2,
    })
}

// Cancels the crawl on the first Ctrl-C
fn abort_on_ctrl_c(abort: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received Ctrl-C, stopping crawl");
            abort.cancel();
        }
    });
}

// Prints the outcome either as text or JSON
fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", assessment(outcome));
        println!("🔬 Statistics:");
        println!("{}", outcome.statistics);
    }
    Ok(())
}

fn assessment(outcome: &Outcome) -> String {
    match (&outcome.found, outcome.verified) {
        (Some(uri), Some(true)) => format!("✅ found URI \"{}\" is correct.", uri),
        (Some(uri), Some(false)) => format!("❎ found URI \"{}\" incorrect.", uri),
        (Some(uri), None) => format!("🔎 found URI \"{}\" (not verified)", uri),
        (None, _) if outcome.interrupted => "⛔ crawl interrupted, no URI reported.".to_string(),
        (None, _) => "❎ no URI found.".to_string(),
    }
}
