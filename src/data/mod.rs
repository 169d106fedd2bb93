pub mod earthquake;
pub mod feed;
pub mod geojson;
