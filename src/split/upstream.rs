//! Upstream discovery and variant fetching.
//!
//! The discovery endpoint returns `{ "variants": [urlA, urlB] }`. Both
//! variant documents are then fetched concurrently. Nothing is cached; every
//! request goes back to the origins.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::Bucket;

/// Errors from talking to the discovery endpoint or a variant origin.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid discovery response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("discovery returned {got} variant url(s), expected 2")]
    TooFewVariants { got: usize },
}

/// Fetches a URL and returns its body as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, UpstreamError>;
}

/// `Fetcher` backed by a pooled reqwest client.
///
/// Non-2xx responses are failures.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher. `timeout` of `None` keeps the client's default.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::from_client(builder.build()?))
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, UpstreamError> {
        let wrap = |source: reqwest::Error| UpstreamError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(wrap)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(wrap)
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryBody {
    variants: Vec<String>,
}

/// The two variant URLs, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSource {
    urls: [String; 2],
}

impl VariantSource {
    /// Builds a source from a discovery list. Entries past the second are ignored.
    pub fn from_list(list: Vec<String>) -> Result<Self, UpstreamError> {
        let got = list.len();
        let mut iter = list.into_iter();
        match (iter.next(), iter.next()) {
            (Some(a), Some(b)) => Ok(Self { urls: [a, b] }),
            _ => Err(UpstreamError::TooFewVariants { got }),
        }
    }

    /// URL serving the given bucket's document.
    pub fn url(&self, bucket: Bucket) -> &str {
        &self.urls[bucket.index()]
    }
}

/// Raw document fetched from one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDocument {
    pub bucket: Bucket,
    pub html: String,
}

/// Both fetched documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPair {
    a: VariantDocument,
    b: VariantDocument,
}

impl VariantPair {
    /// Consumes the pair and keeps the document for `bucket`.
    pub fn take(self, bucket: Bucket) -> VariantDocument {
        match bucket {
            Bucket::A => self.a,
            Bucket::B => self.b,
        }
    }
}

/// Queries the discovery endpoint for the two variant URLs.
pub async fn discover<F: Fetcher + ?Sized>(
    fetcher: &F,
    endpoint: &str,
) -> Result<VariantSource, UpstreamError> {
    let body = fetcher.get_text(endpoint).await?;
    let parsed: DiscoveryBody =
        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode {
            url: endpoint.to_string(),
            source,
        })?;
    VariantSource::from_list(parsed.variants)
}

/// Fetches both variant documents concurrently.
///
/// Fails if either origin fails.
pub async fn fetch_variants<F: Fetcher + ?Sized>(
    fetcher: &F,
    source: &VariantSource,
) -> Result<VariantPair, UpstreamError> {
    let (a, b) = tokio::try_join!(
        fetcher.get_text(source.url(Bucket::A)),
        fetcher.get_text(source.url(Bucket::B)),
    )?;

    Ok(VariantPair {
        a: VariantDocument {
            bucket: Bucket::A,
            html: a,
        },
        b: VariantDocument {
            bucket: Bucket::B,
            html: b,
        },
    })
}
