use anyhow::Context as _;
use quakemap::{
    core::geo::Point,
    ui::{
        controls::LayerControl,
        legend::Legend,
        widget::{MapWidget, MapWidgetExt},
    },
    FeedKind, Map, QuakeMapConfig,
};

/// Earthquake map viewer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let app = QuakeMapApp::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Earthquakes - Past Day"),
        ..Default::default()
    };

    eframe::run_native("quakemap-app", options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| anyhow::anyhow!("event loop failed: {}", e))
}

/// Config path from the first argument, else `QUAKEMAP_CONFIG`, else defaults
fn load_config() -> anyhow::Result<QuakeMapConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUAKEMAP_CONFIG").ok());

    match path {
        Some(path) => QuakeMapConfig::from_json_file(&path)
            .with_context(|| format!("reading configuration from {}", path)),
        None => {
            log::info!("no configuration given, using defaults");
            Ok(QuakeMapConfig::default())
        }
    }
}

struct QuakeMapApp {
    map_widget: MapWidget,
    layer_control: LayerControl,
    show_layer_panel: bool,
}

impl QuakeMapApp {
    fn new(config: &QuakeMapConfig) -> anyhow::Result<Self> {
        let mut map = Map::earthquake_map(config, Point::new(1200.0, 800.0))
            .context("building the earthquake map")?;
        map.start_feeds(&config.feeds);

        Ok(Self {
            map_widget: MapWidget::new(map).with_legend(Legend::depth()),
            layer_control: LayerControl::new(),
            show_layer_panel: true,
        })
    }

    fn status_line(&self) -> String {
        let map = self.map_widget.map();
        let viewport = map.viewport();
        format!(
            "Plates: {} | Earthquakes: {} | Center: {:.4}, {:.4} | Zoom: {:.2}",
            map.feed_status(FeedKind::TectonicPlates),
            map.feed_status(FeedKind::Earthquakes),
            viewport.center.lat,
            viewport.center.lng,
            viewport.zoom
        )
    }
}

impl eframe::App for QuakeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_layer_panel, "Layer Panel");
                    let config = self.map_widget.config_mut();
                    ui.checkbox(&mut config.show_legend, "Legend");
                    ui.checkbox(&mut config.show_zoom_controls, "Zoom Controls");
                    ui.checkbox(&mut config.show_attribution, "Attribution");
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(self.status_line());
        });

        if self.show_layer_panel {
            egui::SidePanel::right("layer_panel")
                .resizable(true)
                .show(ctx, |ui| {
                    self.layer_control.show(ui, self.map_widget.map_mut());
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                ui.map_widget(&mut self.map_widget);
            });
    }
}
