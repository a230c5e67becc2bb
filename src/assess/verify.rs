// src/assess/verify.rs
// =============================================================================
// Final acceptance check for the crawl's answer.
//
// Performs one fresh GET, independent of the crawl's memory, and looks for
// the query in the body. The result is only reported to the user; it never
// influences the traversal.
// =============================================================================

use reqwest::Client;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::scout::build_client;

pub struct Verifier {
    client: Client,
}

impl Verifier {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    // Is `uri` a page that contains `query`? Any network error means no.
    pub async fn verify(&self, uri: &Url, query: &str) -> bool {
        match self.body(uri).await {
            Ok(body) => body.contains(query),
            Err(error) => {
                warn!(%uri, %error, "💥 failed to verify answer");
                false
            }
        }
    }

    async fn body(&self, uri: &Url) -> reqwest::Result<String> {
        self.client.get(uri.clone()).send().await?.text().await
    }
}
