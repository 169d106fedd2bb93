//! Remote feed loading for the two overlays.
//!
//! Each feed is fetched by its own task and reported as a [`FeedEvent`]. The
//! map joins the events on its update tick; a failed feed leaves its overlay
//! empty and nothing else is affected.

use crate::core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::data::geojson::{GeoJson, GeoJsonFeature};
use crate::runtime::{self, AsyncHandle};
use crate::{MapError, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP client for feed requests
static HTTP_CLIENT: Lazy<reqwest::Client> =
    Lazy::new(|| build_client(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)));

pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("quakemap/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Which overlay a feed populates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    TectonicPlates,
    Earthquakes,
}

impl FeedKind {
    pub fn layer_id(&self) -> &'static str {
        match self {
            FeedKind::TectonicPlates => crate::core::constants::TECTONIC_PLATES_LAYER_ID,
            FeedKind::Earthquakes => crate::core::constants::EARTHQUAKES_LAYER_ID,
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::TectonicPlates => write!(f, "tectonic plates"),
            FeedKind::Earthquakes => write!(f, "earthquakes"),
        }
    }
}

/// Location of a GeoJSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Url(url) => f.write_str(url),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of one feed load
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    Loaded(Vec<GeoJsonFeature>),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub kind: FeedKind,
    pub outcome: FeedOutcome,
}

/// What the UI shows for a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Pending,
    Loaded(usize),
    Failed(String),
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Pending => write!(f, "loading…"),
            FeedStatus::Loaded(n) => write!(f, "{} features", n),
            FeedStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Anything that can produce a GeoJSON document for a source
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<GeoJson>;
}

/// Fetches feeds over HTTP or from disk
#[derive(Clone)]
pub struct FeedLoader {
    client: reqwest::Client,
}

impl FeedLoader {
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
        }
    }

    async fn fetch_text(&self, source: &FeedSource) -> Result<String> {
        match source {
            FeedSource::Url(url) => {
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok(response.text().await?)
            }
            FeedSource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
        }
    }
}

impl Default for FeedLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for FeedLoader {
    async fn fetch(&self, source: &FeedSource) -> Result<GeoJson> {
        let text = self.fetch_text(source).await?;
        text.parse()
    }
}

/// Loads one feed and folds any error into a [`FeedOutcome::Failed`]
pub async fn load_feed(
    fetcher: &dyn DocumentFetcher,
    kind: FeedKind,
    source: &FeedSource,
) -> FeedEvent {
    log::debug!("fetching {} from {}", kind, source);

    let outcome = match fetcher.fetch(source).await {
        Ok(geojson) => {
            let features = geojson.into_features();
            log::info!("{} feed loaded: {} features", kind, features.len());
            FeedOutcome::Loaded(features)
        }
        Err(e) => {
            log::warn!("{} feed from {} failed: {}", kind, source, e);
            FeedOutcome::Failed {
                reason: describe(&e),
            }
        }
    };

    FeedEvent { kind, outcome }
}

fn describe(error: &MapError) -> String {
    match error {
        MapError::Network(e) if e.is_timeout() => "request timed out".to_string(),
        MapError::Network(e) => match e.status() {
            Some(status) => format!("HTTP {}", status),
            None => "network unreachable".to_string(),
        },
        other => other.to_string(),
    }
}

/// Runs a feed load as an independent task; the event is sent when it finishes.
/// Fails only when the task could not be started.
pub fn spawn_feed(
    fetcher: Arc<dyn DocumentFetcher>,
    kind: FeedKind,
    source: FeedSource,
    events: Sender<FeedEvent>,
) -> Result<Box<dyn AsyncHandle>> {
    runtime::spawn(async move {
        let event = load_feed(fetcher.as_ref(), kind, &source).await;
        if events.send(event).is_err() {
            log::debug!("{} feed finished after the map was dropped", kind);
        }
    })
}
