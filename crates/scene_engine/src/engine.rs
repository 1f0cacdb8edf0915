//! Core engine implementation
//!
//! The engine owns the process supervisor, the asset manager, a transport
//! and a clock, and drives them once per frame:
//!
//! 1. sample the clock and forward it as a time update,
//! 2. dispatch queued scene signals,
//! 3. deliver transport responses to waiting loads.
//!
//! Scene traversals happen between frames through [`Engine::traverse`],
//! which brackets a pass over the scene's nodes with activation and
//! deactivation so the scene's processes are reaped exactly once per pass.

use crate::{
    application::Application,
    assets::{AssetManager, LoadContext, PollReport, Transport},
    core::config::{ApplicationConfig, ConfigError},
    events::{LogObserver, ProcessEventMask},
    foundation::time::{Clock, Timer},
    process::{ProcessSupervisor, ReapReport},
    scene::{SceneId, SceneSignal, SignalQueue},
};
use thiserror::Error;

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine<T> {
    /// Supervisor of asynchronous work per scene
    supervisor: ProcessSupervisor,

    /// Asset management system
    assets: AssetManager<T>,

    /// Cross-domain fetch capability
    transport: Box<dyn Transport>,

    /// Time source sampled once per frame
    clock: Box<dyn Clock>,

    /// Signals waiting for the next frame
    signals: SignalQueue,

    /// Frame timing
    timer: Timer,

    /// Engine configuration
    config: ApplicationConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl<T: 'static> Engine<T> {
    /// Create a new engine instance
    pub fn new(
        config: ApplicationConfig,
        transport: Box<dyn Transport>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let mut supervisor = ProcessSupervisor::new(config.processes.clone());
        if config.engine.log_process_events {
            supervisor.register_observer(ProcessEventMask::all(), Box::new(LogObserver));
        }
        let assets = AssetManager::new(config.assets.clone());
        let timer = Timer::new(clock.now());

        Ok(Self {
            supervisor,
            assets,
            transport,
            clock,
            signals: SignalQueue::new(),
            timer,
            config,
            running: true,
        })
    }

    /// Run the engine main loop with the given application
    pub fn run<A: Application<Asset = T>>(
        config: ApplicationConfig,
        transport: Box<dyn Transport>,
        clock: Box<dyn Clock>,
        app: &mut A,
    ) -> Result<(), EngineError> {
        let mut engine = Self::new(config, transport, clock)?;

        // Initialize application
        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");

        while engine.running {
            engine.tick();
            let delta_time = engine.timer.delta_time();

            // Update application
            app.update(&mut engine, delta_time)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {}", e)))?;

            if let Some(max_frames) = engine.config.engine.max_frames {
                if engine.timer.frame_count() >= max_frames {
                    log::info!("Reached frame limit ({})", max_frames);
                    engine.running = false;
                }
            }
        }

        // Cleanup
        app.cleanup(&mut engine);

        log::info!("Engine shutdown complete");
        Ok(())
    }

    /// Advance one frame: time update, queued signals, transport responses
    pub fn tick(&mut self) -> PollReport {
        let now = self.clock.now();
        self.timer.update(now);
        self.supervisor.time_updated(now);

        for signal in self.signals.drain() {
            log::trace!("Dispatching {:?}", signal);
            if let Some(report) = self.supervisor.handle_signal(signal) {
                log::trace!("Deactivation reaped {:?}", report);
            }
        }

        let report = self.assets.poll(&self.supervisor, &mut *self.transport);
        if report != PollReport::default() {
            log::debug!("Frame {}: {:?}", self.timer.frame_count(), report);
        }
        report
    }

    /// Queue a scene signal for the next frame
    pub fn send(&mut self, signal: SceneSignal) {
        self.signals.send(signal);
    }

    /// Create a scene's process group immediately
    pub fn create_scene(&mut self, scene_id: impl Into<SceneId>) {
        self.supervisor.scene_created(scene_id.into());
    }

    /// Discard a scene's process group immediately
    pub fn destroy_scene(&mut self, scene_id: &SceneId) {
        self.supervisor.scene_destroyed(scene_id);
    }

    /// Traverse a scene
    ///
    /// Activates the scene, runs `visit` with a load context and deactivates
    /// the scene again, which reaps its process group.
    pub fn traverse<R>(
        &mut self,
        scene_id: &SceneId,
        visit: impl FnOnce(&mut LoadContext<'_, T>) -> R,
    ) -> (R, ReapReport) {
        self.supervisor.scene_activated(scene_id.clone());
        let result = {
            let mut ctx = self.load_context();
            visit(&mut ctx)
        };
        let report = self.supervisor.scene_deactivated();
        (result, report)
    }

    /// Borrow the supervisor, asset manager and transport together
    pub fn load_context(&mut self) -> LoadContext<'_, T> {
        LoadContext {
            supervisor: &mut self.supervisor,
            assets: &mut self.assets,
            transport: &mut *self.transport,
        }
    }

    /// Drop every process group, cached asset and queued signal
    pub fn reset(&mut self) {
        log::info!("Resetting engine");
        self.signals.clear();
        self.supervisor.reset();
        self.assets.reset();
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the process supervisor
    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Get mutable access to the process supervisor
    pub fn supervisor_mut(&mut self) -> &mut ProcessSupervisor {
        &mut self.supervisor
    }

    /// Get the asset manager
    pub fn assets(&self) -> &AssetManager<T> {
        &self.assets
    }

    /// Get mutable access to the asset manager
    pub fn assets_mut(&mut self) -> &mut AssetManager<T> {
        &mut self.assets
    }

    /// Get the frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Get the engine configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}
