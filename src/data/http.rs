//! Generic JSON enrichment feed.
//!
//! Any service that answers `GET {base}?signal=..&team=..&name=..` with an
//! attributes object can back one or more signals. A 404 means the feed
//! has no record for the identity.
//!
//! Auth: optional `x-api-key` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use super::{Attributes, EnrichmentSource, IdentityHints};

pub struct HttpSource {
    name: String,
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpSource {
    pub fn new(name: &str, base_url: &str, api_key: Option<SecretString>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("STACKER/0.1.0")
            .build()
            .with_context(|| format!("Failed to build HTTP client for source {name}"))?;
        Ok(Self {
            name: name.to_string(),
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, hints: &IdentityHints) -> String {
        let mut url = format!(
            "{}?signal={}&team={}&venue={}",
            self.base_url,
            hints.signal,
            urlencoding::encode(&hints.team),
            urlencoding::encode(&hints.venue),
        );
        if let Some(name) = &hints.name {
            url.push_str(&format!("&name={}", urlencoding::encode(name)));
        }
        if let Some(opponent) = &hints.opponent {
            url.push_str(&format!("&opponent={}", urlencoding::encode(opponent)));
        }
        url
    }
}

#[async_trait]
impl EnrichmentSource for HttpSource {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>> {
        let url = self.url(hints);
        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key.expose_secret().as_str());
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(source = %self.name, %url, "No record");
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("{} API error: {status}", self.name);
        }

        let attrs: Attributes = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.name))?;
        Ok(Some(attrs))
    }
}
