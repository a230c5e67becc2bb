// src/assess/relevance.rs
// =============================================================================
// Host allow-list applied to every discovered link before the crawl
// schedules it. The seed itself is never filtered.
//
// Each rule is a regular expression matched case-insensitively anywhere in
// the host, so the rule `cronoscx\.de` accepts `www.cronoscx.de` as well as
// `jobs.CRONOSCX.de`.
// =============================================================================

use regex::{Regex, RegexBuilder};
use url::Url;

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    rules: Vec<Regex>,
}

impl RelevanceFilter {
    // Compiles host patterns into a filter
    //
    // Returns an error for the first pattern that is not a valid regex.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|pattern| {
                RegexBuilder::new(pattern.as_ref())
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    // The default rule for a seed: its host without a leading "www.",
    // escaped so that dots match literally.
    //
    // Returns None if the seed has no host.
    pub fn seed_pattern(seed: &Url) -> Option<String> {
        let host = seed.host_str()?;
        let domain = host.strip_prefix("www.").unwrap_or(host);
        Some(regex::escape(domain))
    }

    // Should this link be followed?
    pub fn relevant(&self, uri: &Url) -> bool {
        match uri.host_str() {
            Some(host) => self.rules.iter().any(|rule| rule.is_match(host)),
            // mailto-like leftovers, data: URIs, ...
            None => false,
        }
    }
}
