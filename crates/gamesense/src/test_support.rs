//! In-memory collaborators for tests.

use crate::dispatch::Sleeper;
use crate::error::{FetchError, ModelError};
use crate::guide::PageSource;
use crate::model::ModelClient;
use async_trait::async_trait;
use gamesense_core::payload::ModelRequest;
use reqwest::Url;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned pages keyed by normalized URL; anything else is a 404.
#[derive(Default)]
pub struct FakePageSource {
    pages: HashMap<String, (String, Duration)>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakePageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_slow_page(url, html, Duration::ZERO)
    }

    pub fn with_slow_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
        self.pages
            .insert(url.to_string(), (html.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most fetches that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight count when a fetch ends or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let Some((html, delay)) = self.pages.get(url.as_str()).cloned() else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(html)
    }
}

/// Replays scripted results in order and records what it was asked.
pub struct FakeModelClient {
    results: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl FakeModelClient {
    pub fn new(results: Vec<Result<String, ModelError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for FakeModelClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Unknown("no scripted result left".to_string())))
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
