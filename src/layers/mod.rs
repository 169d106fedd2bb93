pub mod base;
pub mod macros;
pub mod manager;
pub mod tile;
pub mod vector;

pub use base::{LayerProperties, LayerRole, LayerTrait, LayerType};
pub use manager::LayerManager;
pub use tile::TileLayer;
pub use vector::VectorLayer;
