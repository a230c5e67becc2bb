// src/config.rs
// =============================================================================
// Turns raw command-line values into validated settings.
//
// Everything the crawl needs is checked here, before any request is sent:
// - the query is not empty (an empty query would match every page)
// - the seed is an absolute http(s) URL with a host
// - host patterns are valid regular expressions
// - the timeout is positive
// =============================================================================

use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::assess::RelevanceFilter;
use crate::cli::Cli;
use crate::crawl::Strategy;

pub const DEFAULT_QUERY: &str = "Door-to-Door";
pub const DEFAULT_SEED: &str = "http://www.cronoscx.de";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the query must not be empty")]
    EmptyQuery,

    #[error("invalid seed URI '{seed}': {error}")]
    InvalidSeed {
        seed: String,
        #[source]
        error: url::ParseError,
    },

    #[error("unsupported scheme '{scheme}' (only http and https can be crawled)")]
    UnsupportedScheme { scheme: String },

    #[error("seed URI '{seed}' has no host")]
    MissingHost { seed: String },

    #[error("invalid host pattern: {error}")]
    InvalidHostPattern {
        #[source]
        error: regex::Error,
    },

    #[error("the timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub query: String,
    pub seed: Url,
    pub strategy: Strategy,
    /// The patterns behind `relevance`, for logging
    pub host_patterns: Vec<String>,
    pub relevance: RelevanceFilter,
    pub timeout: Duration,
    pub verify: bool,
    pub json: bool,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.query.is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if cli.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let seed = parse_seed(&cli.seed)?;

        let host_patterns = if cli.hosts.is_empty() {
            let pattern = RelevanceFilter::seed_pattern(&seed).ok_or_else(|| {
                ConfigError::MissingHost {
                    seed: cli.seed.clone(),
                }
            })?;
            vec![pattern]
        } else {
            cli.hosts
        };
        let relevance = RelevanceFilter::new(&host_patterns)
            .map_err(|error| ConfigError::InvalidHostPattern { error })?;

        Ok(Self {
            query: cli.query,
            seed,
            strategy: cli.strategy,
            host_patterns,
            relevance,
            timeout: Duration::from_secs(cli.timeout),
            verify: !cli.no_verify,
            json: cli.json,
        })
    }
}

fn parse_seed(raw: &str) -> Result<Url, ConfigError> {
    let seed = Url::parse(raw).map_err(|error| ConfigError::InvalidSeed {
        seed: raw.to_string(),
        error,
    })?;

    if !matches!(seed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            scheme: seed.scheme().to_string(),
        });
    }
    if seed.host_str().is_none() {
        return Err(ConfigError::MissingHost {
            seed: raw.to_string(),
        });
    }

    Ok(seed)
}
