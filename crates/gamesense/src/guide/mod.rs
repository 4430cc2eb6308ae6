mod fetch;

use crate::error::FetchError;
use crate::prelude::*;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use fetch::FetchOptions;
pub use gamesense_core::guide::{GuideStatus, GuideText, DEFAULT_MAX_GUIDE_CHARS};

/// Client identifier sent with every guide request.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; GameSenseBot/1.0)";

/// Default cap on the bytes read from one guide page.
pub const DEFAULT_MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, clap::Parser)]
#[command(name = "guide")]
#[command(about = "Inspect guide pages the way the model sees them")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Fetch a guide page and print its cleaned text
    #[clap(name = "fetch")]
    Fetch(FetchOptions),
}

pub async fn run(app: App, _global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Fetch(options) => fetch::fetch(options).await,
    }
}

/// Parse a guide URL, accepting only absolute http(s) URLs.
pub fn validate_guide_url(raw: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(f!("unsupported scheme '{other}'"))),
    }

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Where guide markup comes from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError>;
}

/// Plain HTTP GET with the bot user agent.
///
/// Bodies larger than `max_bytes` are refused without being buffered.
pub struct HttpPageSource {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpPageSource {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|length| usize::try_from(length).map_or(true, |len| len > self.max_bytes))
        {
            return Err(too_large());
        }

        // Declared length is advisory; count while reading
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Limits applied to the guides of one request.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub max_chars: usize,
    pub concurrency: usize,
    /// Time budget for all guides of a request together.
    pub deadline: Duration,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_GUIDE_CHARS,
            concurrency: 4,
            deadline: Duration::from_secs(20),
        }
    }
}

/// Turns guide URLs into cleaned text, degrading failures to a placeholder.
#[derive(Clone)]
pub struct GuideFetcher {
    source: Arc<dyn PageSource>,
    limits: FetchLimits,
}

impl GuideFetcher {
    pub fn new(source: Arc<dyn PageSource>, limits: FetchLimits) -> Self {
        Self { source, limits }
    }

    /// Fetch and clean one guide, surfacing every failure.
    pub async fn try_fetch_guide_text(&self, raw_url: &str) -> Result<String, FetchError> {
        let url = validate_guide_url(raw_url)?;
        let html = self.source.fetch_html(&url).await?;

        gamesense_core::guide::extract_guide_text(&html, self.limits.max_chars).map_err(|source| {
            FetchError::Extract {
                url: raw_url.to_string(),
                source,
            }
        })
    }

    /// Fetch and clean one guide. Failures become the placeholder text.
    pub async fn fetch_guide_text(&self, url: &str) -> GuideText {
        let start = Instant::now();

        match self.try_fetch_guide_text(url).await {
            Ok(text) => {
                log::debug!(
                    "Fetched guide {} ({} chars) in {} ms",
                    url,
                    text.chars().count(),
                    start.elapsed().as_millis()
                );
                GuideText::loaded(url, text)
            }
            Err(err) => {
                log::warn!("Guide fetch error: {}", err);
                GuideText::unavailable(url)
            }
        }
    }

    /// Fetch every guide with bounded concurrency under one shared deadline.
    ///
    /// The result has one entry per URL, in input order.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<GuideText> {
        let deadline = tokio::time::Instant::now() + self.limits.deadline;

        let fetches: Vec<_> = urls
            .iter()
            .map(|url| async move {
                match tokio::time::timeout_at(deadline, self.fetch_guide_text(url)).await {
                    Ok(guide) => guide,
                    Err(_) => {
                        log::warn!(
                            "Guide fetch error: {}",
                            FetchError::Timeout { url: url.clone() }
                        );
                        GuideText::unavailable(url.as_str())
                    }
                }
            })
            .collect();

        stream::iter(fetches)
            .buffered(self.limits.concurrency.max(1))
            .collect()
            .await
    }
}
