//! Slippy-map tile layers: URL templating, download, decode and an LRU of
//! decoded tiles per layer.

pub mod cache;
pub mod layer;
pub mod loader;
pub mod source;

pub use cache::{TileCache, TileState};
pub use layer::TileLayer;
pub use loader::{TileImage, TileLoader, TileLoaderConfig};
pub use source::{TileSource, UrlTemplateSource};
