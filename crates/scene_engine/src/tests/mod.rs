//! Cross-module scenarios: supervisor, asset manager and engine together


use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::assets::{
    AssetError, AssetManager, Importer, LoadCallbacks, LoadRequest, PollReport, QueuedTransport,
};
use crate::core::config::AssetConfig;
use crate::process::{ProcessHandle, ProcessSupervisor, ReapReport};
use crate::scene::SceneId;

/// UTF-8 text importer
fn text_parser(_uri: &str, payload: &[u8]) -> Result<String, AssetError> {
    std::str::from_utf8(payload)
        .map(str::to_owned)
        .map_err(|e| AssetError::Parse(e.to_string()))
}

/// Records which load callbacks fired
#[derive(Clone, Default)]
struct CallbackLog {
    loaded: Rc<RefCell<Vec<Arc<String>>>>,
    errors: Rc<RefCell<Vec<String>>>,
    timeouts: Rc<Cell<usize>>,
}

impl CallbackLog {
    fn callbacks(&self) -> LoadCallbacks<String> {
        let loaded = Rc::clone(&self.loaded);
        let errors = Rc::clone(&self.errors);
        let timeouts = Rc::clone(&self.timeouts);
        LoadCallbacks::new()
            .on_success(move |asset| loaded.borrow_mut().push(asset))
            .on_error(move |message| errors.borrow_mut().push(message))
            .on_timeout(move || timeouts.set(timeouts.get() + 1))
    }

    fn loaded(&self) -> usize {
        self.loaded.borrow().len()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    fn timeouts(&self) -> usize {
        self.timeouts.get()
    }
}

/// Supervisor, asset manager and queued transport with scene "main" active
struct Harness {
    supervisor: ProcessSupervisor,
    assets: AssetManager<String>,
    transport: QueuedTransport,
    scene: SceneId,
}

impl Harness {
    fn new(config: AssetConfig) -> Self {
        let scene = SceneId::new("main");
        let mut supervisor = ProcessSupervisor::default();
        supervisor.scene_created(scene.clone());
        supervisor.scene_activated(scene.clone());

        let mut assets = AssetManager::new(config);
        assets
            .register_importer(Importer::new("txt", text_parser).with_param("format", "text"))
            .unwrap();

        Self {
            supervisor,
            assets,
            transport: QueuedTransport::new(),
            scene,
        }
    }

    fn load(&mut self, uri: &str, log: &CallbackLog) -> ProcessHandle {
        self.load_request(LoadRequest::new(uri, "txt"), log)
    }

    fn load_request(&mut self, request: LoadRequest, log: &CallbackLog) -> ProcessHandle {
        self.assets
            .load_asset(&mut self.supervisor, &mut self.transport, request, log.callbacks())
            .unwrap()
    }

    fn poll(&mut self) -> PollReport {
        self.assets.poll(&self.supervisor, &mut self.transport)
    }

    /// End the current traversal pass at `time` and begin the next one
    fn end_pass_at(&mut self, time: f64) -> ReapReport {
        self.supervisor.time_updated(time);
        let report = self.supervisor.scene_deactivated();
        self.supervisor.scene_activated(self.scene.clone());
        report
    }

    fn live(&self) -> usize {
        self.supervisor.num_processes(Some(&self.scene))
    }
}
