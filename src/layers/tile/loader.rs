use crate::core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::core::geo::TileCoord;
use crate::prelude::HashSet;
use crate::runtime::{self, AsyncSpawner};
use crate::{MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

/// Shared async HTTP client for tile fetching
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("quakemap/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default tile client: {}", e);
            reqwest::Client::new()
        })
});

/// A decoded tile, RGBA8 row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TileImage {
    /// Decodes PNG or JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// Result of a tile loading operation
#[derive(Debug)]
pub struct TileResult {
    pub coord: TileCoord,
    pub image: Result<TileImage>,
}

#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Maximum concurrent tile downloads per layer
    pub max_concurrent: usize,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        // Browsers allow six connections per host
        Self { max_concurrent: 6 }
    }
}

/// Downloads tiles on the async runtime and hands results back over a channel
pub struct TileLoader {
    config: TileLoaderConfig,
    spawner: Arc<dyn AsyncSpawner>,
    tx: Sender<TileResult>,
    rx: Receiver<TileResult>,
    in_flight: HashSet<TileCoord>,
}

impl TileLoader {
    pub fn new(config: TileLoaderConfig) -> Self {
        Self::with_spawner(config, runtime::runtime())
    }

    pub fn with_spawner(config: TileLoaderConfig, spawner: Arc<dyn AsyncSpawner>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            config,
            spawner,
            tx,
            rx,
            in_flight: HashSet::default(),
        }
    }

    /// Starts a download unless the tile is already in flight or the
    /// concurrency limit is reached. Returns whether a download started.
    pub fn request(&mut self, coord: TileCoord, url: String) -> bool {
        if self.in_flight.contains(&coord) || self.in_flight.len() >= self.config.max_concurrent {
            return false;
        }
        self.in_flight.insert(coord);

        let tx = self.tx.clone();
        let spawned = self.spawner.spawn_boxed(Box::pin(async move {
            log::debug!("fetching tile {:?} from {}", coord, url);
            let image = fetch_tile(&url).await;
            if let Err(e) = &image {
                log::warn!("tile {:?} failed: {}", coord, e);
            }
            let _ = tx.send(TileResult { coord, image });
        }));

        match spawned {
            Ok(_) => true,
            Err(e) => {
                log::warn!("tile {:?} not requested: {}", coord, e);
                self.in_flight.remove(&coord);
                false
            }
        }
    }

    /// Collects finished downloads
    pub fn drain(&mut self) -> Vec<TileResult> {
        let results: Vec<TileResult> = self.rx.try_iter().collect();
        for result in &results {
            self.in_flight.remove(&result.coord);
        }
        results
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl Default for TileLoader {
    fn default() -> Self {
        Self::new(TileLoaderConfig::default())
    }
}

async fn fetch_tile(url: &str) -> Result<TileImage> {
    let response = HTTP_CLIENT.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    tokio::task::spawn_blocking(move || TileImage::decode(&bytes))
        .await
        .map_err(|e| MapError::Render(format!("tile decode task failed: {}", e)))?
}
