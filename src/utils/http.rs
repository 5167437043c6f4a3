// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::RosterConfig;

/// Source of raw roster XML bodies.
#[async_trait]
pub trait RosterFetcher: Send + Sync {
    /// Fetch the body at `url`.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &RosterConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetcher backed by a reqwest client. Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &RosterConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl RosterFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let text = response.error_for_status()?.text().await?;
        Ok(text)
    }
}

/// Build the roster page URL for a term and subject.
///
/// An empty subject addresses the term's subject index. `term` and `subject`
/// are each encoded as a single path segment.
pub fn roster_url(base_url: &str, term: &str, subject: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;

    for segment in [term, subject] {
        if matches!(segment, "." | "..") {
            return Err(AppError::validation(format!(
                "'{segment}' is not a valid roster path segment"
            )));
        }
    }
    if term.is_empty() {
        return Err(AppError::validation("term is empty"));
    }

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AppError::validation(format!("'{base_url}' cannot be a base URL")))?;
        segments.pop_if_empty().push(term);
        if !subject.is_empty() {
            segments.push(subject);
        }
        segments.push("xml").push("");
    }
    Ok(url)
}
