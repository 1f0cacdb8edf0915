//! Scene node that loads one asset on first traversal
//!
//! A node is visited once per traversal of its scene. The first visit serves
//! the asset from the cache or starts a load in the active scene; later
//! visits pick up whatever the load callbacks reported in between. A
//! finished load is acknowledged with [`AssetManager::asset_loaded`], so its
//! process is retired on the next reap instead of timing out.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::transport::Transport;
use super::{AssetError, AssetManager, LoadCallbacks, LoadRequest};
use crate::process::{ProcessHandle, ProcessSupervisor};

/// Everything a node needs during one traversal
pub struct LoadContext<'a, T> {
    /// Supervisor whose active scene owns new load processes
    pub supervisor: &'a mut ProcessSupervisor,
    /// Asset cache and loader
    pub assets: &'a mut AssetManager<T>,
    /// Transport the loads are fetched through
    pub transport: &'a mut dyn Transport,
}

/// Why a load ended without an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// Empty payload or parse error, with its message
    Error(String),
    /// The load process timed out
    TimedOut,
}

/// Node load state
#[derive(Debug, Clone)]
pub enum LoadState<T> {
    /// Not visited yet, or reset
    Idle,
    /// Waiting on the load supervised by this process
    Loading(ProcessHandle),
    /// Asset available
    Loaded(Arc<T>),
    /// Load ended without an asset; the node shows its fallback
    Failed(LoadFailure),
}

enum Outcome<T> {
    Loaded(Arc<T>),
    Error(String),
    TimedOut,
}

type OutcomeSlot<T> = Rc<RefCell<Option<Outcome<T>>>>;

/// Scene node backed by one asset
pub struct AssetLoadNode<T> {
    request: LoadRequest,
    state: LoadState<T>,
    outcome: OutcomeSlot<T>,
}

impl<T: 'static> AssetLoadNode<T> {
    /// Create a node for the given request
    ///
    /// Parameters on the request are sent on top of the importer's own,
    /// e.g. `LoadRequest::new(uri, "dae").with_param("format", "xml")`.
    pub fn new(request: LoadRequest) -> Self {
        Self {
            request,
            state: LoadState::Idle,
            outcome: Rc::new(RefCell::new(None)),
        }
    }

    /// The request this node loads
    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    /// Current state
    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Loaded asset, if any
    pub fn asset(&self) -> Option<&Arc<T>> {
        match &self.state {
            LoadState::Loaded(asset) => Some(asset),
            _ => None,
        }
    }

    /// Visit the node during its scene's traversal
    ///
    /// Returns the asset once it is available. Only fails when a load
    /// cannot be started, in which case the node stays idle.
    pub fn visit(&mut self, ctx: &mut LoadContext<'_, T>) -> Result<Option<Arc<T>>, AssetError> {
        self.settle(ctx);

        if matches!(self.state, LoadState::Idle) {
            if let Some(asset) = ctx.assets.get_asset(&self.request.uri) {
                self.state = LoadState::Loaded(Arc::clone(&asset));
                return Ok(Some(asset));
            }
            let process = ctx.assets.load_asset(
                ctx.supervisor,
                ctx.transport,
                self.request.clone(),
                self.callbacks(),
            )?;
            self.state = LoadState::Loading(process);
            return Ok(None);
        }

        match &self.state {
            LoadState::Loaded(asset) => {
                let asset = Arc::clone(asset);
                // Keep the cache entry young while the node uses it
                ctx.assets.get_asset(&self.request.uri);
                Ok(Some(asset))
            }
            LoadState::Idle | LoadState::Loading(_) | LoadState::Failed(_) => Ok(None),
        }
    }

    /// Forget the current state; the next visit starts over
    ///
    /// A load still in flight has its process killed, so it is reclaimed on
    /// the next reap instead of running into its timeout.
    pub fn reset(&mut self, supervisor: &mut ProcessSupervisor) {
        if let LoadState::Loading(process) = &self.state {
            log::debug!("Abandoning load of {}", self.request.uri);
            supervisor.kill_process(process);
        }
        self.state = LoadState::Idle;
        // Callbacks of an abandoned load write into the old slot
        self.outcome = Rc::new(RefCell::new(None));
    }

    fn callbacks(&self) -> LoadCallbacks<T> {
        let on_success = Rc::clone(&self.outcome);
        let on_error = Rc::clone(&self.outcome);
        let on_timeout = Rc::clone(&self.outcome);
        LoadCallbacks::new()
            .on_success(move |asset| {
                *on_success.borrow_mut() = Some(Outcome::Loaded(asset));
            })
            .on_error(move |message| {
                *on_error.borrow_mut() = Some(Outcome::Error(message));
            })
            .on_timeout(move || {
                on_timeout.borrow_mut().get_or_insert(Outcome::TimedOut);
            })
    }

    fn settle(&mut self, ctx: &mut LoadContext<'_, T>) {
        let LoadState::Loading(process) = &self.state else {
            return;
        };
        let Some(outcome) = self.outcome.borrow_mut().take() else {
            return;
        };

        let next = match outcome {
            Outcome::Loaded(asset) => {
                ctx.assets.asset_loaded(ctx.supervisor, process);
                LoadState::Loaded(asset)
            }
            Outcome::Error(message) => {
                log::warn!("Failed to load {}: {}", self.request.uri, message);
                ctx.assets.asset_loaded(ctx.supervisor, process);
                LoadState::Failed(LoadFailure::Error(message))
            }
            Outcome::TimedOut => {
                log::warn!("Timed out loading {}", self.request.uri);
                LoadState::Failed(LoadFailure::TimedOut)
            }
        };
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Importer, QueuedTransport};
    use crate::core::config::AssetConfig;
    use crate::scene::SceneId;

    fn text(_uri: &str, payload: &[u8]) -> Result<String, AssetError> {
        std::str::from_utf8(payload)
            .map(str::to_owned)
            .map_err(|e| AssetError::Parse(e.to_string()))
    }

    struct Fixture {
        supervisor: ProcessSupervisor,
        assets: AssetManager<String>,
        transport: QueuedTransport,
    }

    impl Fixture {
        fn new(timeout: f64) -> Self {
            let mut supervisor = ProcessSupervisor::default();
            supervisor.scene_created(SceneId::new("main"));
            let mut assets = AssetManager::new(AssetConfig::new().with_load_timeout(timeout));
            assets.register_importer(Importer::new("txt", text)).unwrap();
            Self {
                supervisor,
                assets,
                transport: QueuedTransport::new(),
            }
        }

        /// One traversal of the main scene visiting `node`
        fn traverse(&mut self, node: &mut AssetLoadNode<String>) -> Option<Arc<String>> {
            self.supervisor.scene_activated(SceneId::new("main"));
            let result = {
                let mut ctx = LoadContext {
                    supervisor: &mut self.supervisor,
                    assets: &mut self.assets,
                    transport: &mut self.transport,
                };
                node.visit(&mut ctx).unwrap()
            };
            self.supervisor.scene_deactivated();
            result
        }

        fn poll(&mut self) {
            self.assets.poll(&self.supervisor, &mut self.transport);
        }
    }

    #[test]
    fn test_load_then_loaded() {
        let mut fx = Fixture::new(10.0);
        let mut node = AssetLoadNode::new(LoadRequest::new("hello.txt", "txt"));

        assert!(fx.traverse(&mut node).is_none());
        assert!(matches!(node.state(), LoadState::Loading(_)));
        assert_eq!(fx.supervisor.num_processes(Some(&SceneId::new("main"))), 1);

        fx.transport.respond_uri("hello.txt", b"hi");
        fx.poll();

        let asset = fx.traverse(&mut node).unwrap();
        assert_eq!(asset.as_str(), "hi");
        assert!(node.asset().is_some());
        // Acknowledged load no longer counts as running
        assert_eq!(fx.supervisor.num_processes(Some(&SceneId::new("main"))), 0);
        assert_eq!(fx.transport.requests().len(), 1);
    }

    #[test]
    fn test_cache_hit_skips_fetch() {
        let mut fx = Fixture::new(10.0);
        let mut first = AssetLoadNode::new(LoadRequest::new("hello.txt", "txt"));
        fx.traverse(&mut first);
        fx.transport.respond_uri("hello.txt", b"hi");
        fx.poll();
        fx.traverse(&mut first);

        let mut second = AssetLoadNode::new(LoadRequest::new("hello.txt", "txt"));
        assert_eq!(fx.traverse(&mut second).unwrap().as_str(), "hi");
        assert_eq!(fx.transport.requests().len(), 1);
    }

    #[test]
    fn test_parse_error_falls_back() {
        let mut fx = Fixture::new(10.0);
        let mut node = AssetLoadNode::new(LoadRequest::new("bad.txt", "txt"));
        fx.traverse(&mut node);

        fx.transport.respond_uri("bad.txt", &[0xff, 0xfe]);
        fx.poll();
        assert!(fx.traverse(&mut node).is_none());

        assert!(matches!(node.state(), LoadState::Failed(LoadFailure::Error(_))));
        assert!(!fx.assets.cache().contains("bad.txt"));
        assert_eq!(fx.supervisor.num_processes(Some(&SceneId::new("main"))), 0);
    }

    #[test]
    fn test_timeout_falls_back() {
        let mut fx = Fixture::new(1.0);
        let mut node = AssetLoadNode::new(LoadRequest::new("slow.txt", "txt"));
        fx.traverse(&mut node);

        fx.supervisor.time_updated(1.5);
        // The reap at the end of this traversal fires the timeout
        fx.traverse(&mut node);
        fx.traverse(&mut node);

        assert!(matches!(node.state(), LoadState::Failed(LoadFailure::TimedOut)));
    }

    #[test]
    fn test_params_forwarded() {
        let mut fx = Fixture::new(10.0);
        let mut node =
            AssetLoadNode::new(LoadRequest::new("plane.txt", "txt").with_param("format", "xml"));
        fx.traverse(&mut node);

        let request = &fx.transport.requests()[0];
        assert_eq!(request.params.get("format").map(String::as_str), Some("xml"));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut fx = Fixture::new(10.0);
        let mut node = AssetLoadNode::new(LoadRequest::new("hello.txt", "txt"));
        fx.traverse(&mut node);
        node.reset(&mut fx.supervisor);
        assert!(matches!(node.state(), LoadState::Idle));
        assert_eq!(fx.supervisor.num_processes(Some(&SceneId::new("main"))), 0);

        fx.traverse(&mut node);
        assert_eq!(fx.transport.requests().len(), 2);
        assert_eq!(fx.supervisor.num_processes(Some(&SceneId::new("main"))), 1);
    }

    #[test]
    fn test_reset_abandoned_load_never_times_out() {
        let mut fx = Fixture::new(1.0);
        let mut node = AssetLoadNode::new(LoadRequest::new("slow.txt", "txt"));
        fx.traverse(&mut node);
        let old_outcome = Rc::clone(&node.outcome);
        node.reset(&mut fx.supervisor);

        fx.supervisor.time_updated(5.0);
        fx.supervisor.scene_activated(SceneId::new("main"));
        let report = fx.supervisor.scene_deactivated();

        assert_eq!(report.reclaimed, 1);
        assert_eq!(report.timed_out, 0);
        assert!(old_outcome.borrow().is_none());
        assert!(matches!(node.state(), LoadState::Idle));
    }
}
