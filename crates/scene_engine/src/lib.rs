//! # Scene Engine
//!
//! Core of a scene-graph engine: supervision of asynchronous work per scene
//! and a cross-domain asset cache.
//!
//! ## Features
//!
//! - **Process Supervision**: Per-scene process groups with timeouts, reaped
//!   once at the end of every traversal pass
//! - **Asset Loading**: Importer registry keyed by content type, fetches through
//!   a pluggable transport, LRU cache of parsed assets
//! - **Notifications**: Bitmask-filtered observers for process lifecycle events
//! - **Configuration**: TOML and RON config files for every subsystem
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Viewer {
//!     scene: SceneId,
//!     node: AssetLoadNode<String>,
//! }
//!
//! impl Application for Viewer {
//!     type Asset = String;
//!
//!     fn initialize(&mut self, engine: &mut Engine<String>) -> Result<(), AppError> {
//!         engine.assets_mut().register_importer(Importer::new("txt", |_: &str, p: &[u8]| {
//!             Ok::<_, AssetError>(String::from_utf8_lossy(p).into_owned())
//!         }))?;
//!         engine.create_scene(self.scene.clone());
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine<String>, _delta_time: f64) -> Result<(), AppError> {
//!         let node = &mut self.node;
//!         let (asset, _) = engine.traverse(&self.scene, |ctx| node.visit(ctx));
//!         if asset?.is_some() {
//!             engine.quit();
//!         }
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine<String>) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut app = Viewer {
//!         scene: SceneId::new("main"),
//!         node: AssetLoadNode::new(LoadRequest::new("hello.txt", "txt")),
//!     };
//!     Engine::run(
//!         config,
//!         Box::new(FileTransport::new("assets")),
//!         Box::new(SystemClock::new()),
//!         &mut app,
//!     )?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod scene;
pub mod events;
pub mod process;
pub mod assets;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineError,
        foundation::time::{Clock, ManualClock, SystemClock, Timer},
        scene::{SceneId, SceneSignal},
        events::{LogObserver, ProcessEvent, ProcessEventKind, ProcessEventMask, ProcessObserver},
        process::{ProcessError, ProcessHandle, ProcessSpec, ProcessSupervisor, Timeout},
        assets::{
            AssetError, AssetLoadNode, AssetManager, FileTransport, Importer, LoadCallbacks,
            LoadContext, LoadFailure, LoadRequest, LoadState, QueuedTransport, Transport,
        },
        core::config::{
            ApplicationConfig, AssetConfig, Config, ConfigError, EngineConfig, ProcessConfig,
        },
    };
}

#[cfg(test)]
mod tests;
