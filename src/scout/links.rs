// src/scout/links.rs
// =============================================================================
// This module extracts the links a crawl can follow from an HTML page.
//
// We use the `scraper` crate to find:
// - the first <base href="..."> (changes what relative links resolve against)
// - every <a href="..."> on the page
//
// and the `url` crate to resolve each href the way a browser does
// (RFC 3986 reference resolution).
//
// The output is sorted and deduplicated, so crawling the same page twice
// always yields the same reference list in the same order.
// =============================================================================

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

// Both selectors are constants known to be valid; a parse failure here is a
// programmer error, not a runtime condition
static BASE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid base selector"));
static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

// hrefs starting with one of these (ignoring case) are never followed
const EXCLUDED_PREFIXES: [&str; 3] = ["#", "mailto", "javascript"];

// Extracts all followable links from an HTML document
//
// Parameters:
//   html: the page body
//   page: the URI the body was served from
//
// Returns: absolute URIs without fragments, sorted and without duplicates
pub fn extract_references(html: &str, page: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let base = document
        .select(&BASE)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base_directory(page, href))
        .unwrap_or_else(|| page.clone());

    // BTreeSet sorts by the serialized form and drops duplicates in one go
    let references: BTreeSet<Url> = document
        .select(&ANCHORS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| followable(href))
        .filter_map(|href| resolve(&base, href))
        .collect();

    references.into_iter().collect()
}

// Resolves an href against a base and strips the fragment.
// Returns None (and logs) if the result is not a valid URI.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    match base.join(href.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            Some(url)
        }
        Err(error) => {
            warn!(href, %base, %error, "💥 failed to parse href");
            None
        }
    }
}

fn without_fragment(page: &Url) -> Url {
    let mut page = page.clone();
    page.set_fragment(None);
    page
}

fn followable(href: &str) -> bool {
    let href = href.trim();
    !EXCLUDED_PREFIXES.iter().any(|prefix| {
        href.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

// Turns a <base href> into the URI relative links resolve against.
//
// A base whose last path segment has no trailing slash and no file
// extension names a directory: `/x` behaves like `/x/`.
// An empty base, or one naming the page itself, leaves the page as the base.
fn base_directory(page: &Url, href: &str) -> Option<Url> {
    if href.trim().is_empty() {
        return None;
    }
    let mut base = resolve(page, href).filter(|base| !base.cannot_be_a_base())?;
    if base == without_fragment(page) {
        return None;
    }

    let path = base.path();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    if !path.ends_with('/') && !last_segment.contains('.') {
        let directory = format!("{path}/");
        base.set_path(&directory);
    }

    Some(base)
}
