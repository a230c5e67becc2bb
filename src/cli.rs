// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There are no subcommands: the crawler does exactly one thing. Everything
// has a default, so running the binary without arguments searches the
// default seed for the default query.
//
// The raw values parsed here are validated in config.rs.
// =============================================================================

use clap::Parser;

use crate::config::{DEFAULT_QUERY, DEFAULT_SEED, DEFAULT_TIMEOUT_SECS};
use crate::crawl::Strategy;

#[derive(Parser, Debug)]
#[command(
    name = "query-crawler",
    version,
    about = "Crawls a website until it finds a page containing a query string",
    long_about = "query-crawler starts at a seed page, follows links on relevant hosts and stops \
                  at the first page whose raw HTML contains the query. It prints the page it found \
                  and how much of the site it had to read to get there."
)]
pub struct Cli {
    /// Literal text to search for (case-sensitive, matched against raw HTML)
    #[arg(default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Page where the crawl starts
    #[arg(long, default_value = DEFAULT_SEED)]
    pub seed: String,

    /// How branches of the crawl are scheduled
    #[arg(long, value_enum, default_value_t = Strategy::default())]
    pub strategy: Strategy,

    /// Host pattern (regex, case-insensitive) for links worth following.
    /// May be given several times. Defaults to the seed's domain.
    #[arg(long = "host", value_name = "REGEX")]
    pub hosts: Vec<String>,

    /// Connect and request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Skip re-checking the found page with a fresh request
    #[arg(long)]
    pub no_verify: bool,

    /// Output the result in JSON format instead of text
    #[arg(long)]
    pub json: bool,
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Positional argument with a default
//    - `query-crawler` searches for "Door-to-Door"
//    - `query-crawler "Impressum"` searches for "Impressum"
//
// 2. value_enum
//    - Lets clap turn `--strategy structured` into Strategy::Structured
//    - `--help` lists every accepted value
//
// 3. Vec<String> with #[arg(long = "host")]
//    - Repeating the flag collects all values:
//      --host 'example\.com' --host 'example\.org'
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["query-crawler"]).unwrap();
        assert_eq!(cli.query, "Door-to-Door");
        assert_eq!(cli.seed, "http://www.cronoscx.de");
        assert_eq!(cli.strategy, Strategy::Unbounded);
        assert!(cli.hosts.is_empty());
        assert_eq!(cli.timeout, 10);
        assert!(!cli.no_verify);
        assert!(!cli.json);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "query-crawler",
            "Impressum",
            "--seed",
            "https://example.com/start",
            "--strategy",
            "structured",
            "--host",
            r"example\.com",
            "--host",
            r"example\.org",
            "--timeout",
            "3",
            "--no-verify",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.query, "Impressum");
        assert_eq!(cli.seed, "https://example.com/start");
        assert_eq!(cli.strategy, Strategy::Structured);
        assert_eq!(cli.hosts, vec![r"example\.com", r"example\.org"]);
        assert_eq!(cli.timeout, 3);
        assert!(cli.no_verify);
        assert!(cli.json);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["query-crawler", "--strategy", "bfs"]).is_err());
    }
}
