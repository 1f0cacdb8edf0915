//! Asset viewer demo
//!
//! Loads every `.geo` file of a gallery scene through the file transport and
//! reports what happened to each: loaded, rejected by the parser, or timed
//! out because the file never arrived.
//!
//! Usage: `asset_viewer [config.toml]`

mod geometry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use scene_engine::foundation::logging;
use scene_engine::prelude::*;

use geometry::Geometry;

const GALLERY: [&str; 4] = ["ship.geo", "asteroid.geo", "broken.geo", "missing.geo"];

/// Frame pacing for the wall-clock driven loop
const FRAME_TIME: Duration = Duration::from_millis(16);

struct AssetViewer {
    scene: SceneId,
    nodes: Vec<AssetLoadNode<Geometry>>,
    reported: Vec<bool>,
}

impl AssetViewer {
    fn new(uris: &[&str]) -> Self {
        log::info!("Creating asset viewer for {} asset(s)", uris.len());
        Self {
            scene: SceneId::new("gallery"),
            nodes: uris
                .iter()
                .map(|uri| AssetLoadNode::new(LoadRequest::new(*uri, "geo")))
                .collect(),
            reported: vec![false; uris.len()],
        }
    }

    fn report(node: &AssetLoadNode<Geometry>) -> bool {
        let uri = &node.request().uri;
        match node.state() {
            LoadState::Loaded(geometry) => log::info!(
                "{}: {} vertices, radius {:.2}",
                uri,
                geometry.vertices.len(),
                geometry.bounding_radius()
            ),
            LoadState::Failed(LoadFailure::Error(message)) => {
                log::info!("{}: showing fallback ({})", uri, message);
            }
            LoadState::Failed(LoadFailure::TimedOut) => {
                log::info!("{}: showing fallback (timed out)", uri);
            }
            LoadState::Idle | LoadState::Loading(_) => return false,
        }
        true
    }
}

impl Application for AssetViewer {
    type Asset = Geometry;

    fn initialize(&mut self, engine: &mut Engine<Geometry>) -> Result<(), AppError> {
        log::info!("Initializing asset viewer...");
        engine
            .assets_mut()
            .register_importer(Importer::new("geo", geometry::import))?;
        engine.send(SceneSignal::SceneCreated(self.scene.clone()));
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine<Geometry>, _delta_time: f64) -> Result<(), AppError> {
        let nodes = &mut self.nodes;
        let (visited, _) = engine.traverse(&self.scene, |ctx| {
            nodes
                .iter_mut()
                .map(|node| node.visit(ctx).map(|_| ()))
                .collect::<Result<Vec<()>, AssetError>>()
        });
        visited?;

        for (node, reported) in self.nodes.iter().zip(self.reported.iter_mut()) {
            if !*reported {
                *reported = Self::report(node);
            }
        }
        if self.reported.iter().all(|done| *done) {
            engine.quit();
        }

        std::thread::sleep(FRAME_TIME);
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine<Geometry>) {
        let stats = engine.assets().cache().stats();
        log::info!(
            "Asset viewer done after {} frame(s): {} cached, {} hit(s), {} miss(es)",
            engine.timer().frame_count(),
            engine.assets().cache().len(),
            stats.hits,
            stats.misses
        );
        engine.destroy_scene(&self.scene);
    }
}

/// Load the config file, resolving a relative assets directory against it
fn load_config(path: &Path) -> Result<ApplicationConfig, ConfigError> {
    let mut config = ApplicationConfig::load_from_file(path)?;
    let assets_dir = PathBuf::from(&config.assets.assets_dir);
    if assets_dir.is_relative() {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.assets.assets_dir = base.join(assets_dir).to_string_lossy().into_owned();
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("viewer.toml"), PathBuf::from);
    let config = load_config(&config_path)?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Loaded config from {}", config_path.display());

    let transport = FileTransport::new(&config.assets.assets_dir);
    let mut app = AssetViewer::new(&GALLERY);
    Engine::run(config, Box::new(transport), Box::new(SystemClock::new()), &mut app)?;
    Ok(())
}
