use crate::core::geo::TileCoord;

/// Anything that can produce tile URLs for a given coordinate
pub trait TileSource: Send + Sync {
    fn url(&self, coord: TileCoord) -> String;

    fn min_zoom(&self) -> u8 {
        0
    }

    /// Highest zoom the server has tiles for; deeper views scale these up
    fn max_zoom(&self) -> u8 {
        18
    }

    fn attribution(&self) -> Option<&str> {
        None
    }
}

/// Leaflet-style `{s}/{z}/{x}/{y}.{ext}` URL template
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplateSource {
    pub template: String,
    pub subdomains: Vec<String>,
    pub ext: Option<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: Option<String>,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
            ext: None,
            min_zoom: 0,
            max_zoom: 18,
            attribution: None,
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    /// The standard OpenStreetMap tile server
    pub fn openstreetmap() -> Self {
        Self::new("https://tile.openstreetmap.org/{z}/{x}/{y}.png")
            .with_zoom_range(0, 19)
            .with_attribution("© OpenStreetMap contributors")
    }

    /// Stamen Watercolor as hosted by Stadia Maps
    pub fn stadia_watercolor() -> Self {
        Self::new("https://tiles.stadiamaps.com/tiles/stamen_watercolor/{z}/{x}/{y}.{ext}")
            .with_zoom_range(1, 16)
            .with_ext("jpg")
            .with_attribution(
                "© Stadia Maps © Stamen Design © OpenMapTiles © OpenStreetMap contributors",
            )
    }

    /// Esri World Imagery; note the `{y}/{x}` order
    pub fn esri_world_imagery() -> Self {
        Self::new(
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        )
        .with_attribution(
            "Tiles © Esri — Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, \
             Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
        )
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if url.contains("{s}") && !self.subdomains.is_empty() {
            let idx = ((coord.x + coord.y) as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[idx]);
        }
        if let Some(ext) = &self.ext {
            url = url.replace("{ext}", ext);
        }
        url
    }

    fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }
}
