//! Asset management system
//!
//! Fetches content by URI through a [`Transport`], parses it with the
//! importer registered for its content type and caches the parsed result
//! against the URI. Every fetch is supervised by a process, so a fetch the
//! transport silently loses ends in the caller's timeout callback.
//!
//! Two overlapping loads of the same URI are not deduplicated: each issues
//! its own fetch and each successful parse overwrites the cache entry.

pub mod cache;
pub mod file_transport;
pub mod importer;
pub mod load_node;
pub mod transport;

pub use cache::{AssetCache, CacheStats};
pub use file_transport::FileTransport;
pub use importer::{AssetParser, Importer, ImporterRegistry};
pub use load_node::{AssetLoadNode, LoadContext, LoadFailure, LoadState};
pub use transport::{CallbackToken, QueuedTransport, Transport, TransportRequest, TransportResponse};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::core::config::AssetConfig;
use crate::process::{ProcessError, ProcessHandle, ProcessSpec, ProcessSupervisor};

/// Callbacks of one load
///
/// Exactly one of them fires for a load whose process stays alive until
/// the transport answers, with one exception: an empty payload fires
/// `on_error` and leaves the process to be reaped, which then fires
/// `on_timeout` as well.
pub struct LoadCallbacks<T> {
    on_success: Box<dyn FnOnce(Arc<T>)>,
    on_timeout: Box<dyn FnOnce()>,
    on_error: Box<dyn FnOnce(String)>,
}

impl<T> LoadCallbacks<T> {
    /// Callbacks that do nothing
    pub fn new() -> Self {
        Self {
            on_success: Box::new(|_| {}),
            on_timeout: Box::new(|| {}),
            on_error: Box::new(|_| {}),
        }
    }

    /// Called with the parsed asset
    pub fn on_success(mut self, callback: impl FnOnce(Arc<T>) + 'static) -> Self {
        self.on_success = Box::new(callback);
        self
    }

    /// Called when the load process times out
    pub fn on_timeout(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_timeout = Box::new(callback);
        self
    }

    /// Called with a message when the payload is empty or fails to parse
    pub fn on_error(mut self, callback: impl FnOnce(String) + 'static) -> Self {
        self.on_error = Box::new(callback);
        self
    }
}

impl<T> Default for LoadCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Content location
    pub uri: String,
    /// Content-type tag selecting the importer
    pub kind: String,
    /// Transport endpoint; `None` uses the configured default
    pub endpoint: Option<String>,
    /// Extra transport parameters, overriding the importer's
    pub params: BTreeMap<String, String>,
}

impl LoadRequest {
    /// Load `uri` with the importer for `kind`
    pub fn new(uri: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: kind.into(),
            endpoint: None,
            params: BTreeMap::new(),
        }
    }

    /// Fetch through a specific endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a transport parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Outcome counts of one [`AssetManager::poll`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Payloads parsed and cached
    pub loaded: usize,
    /// Empty payloads and parse failures
    pub failed: usize,
    /// Responses dropped because their process was no longer alive
    pub stale: usize,
    /// Waiting entries dropped because their process ended without a response
    pub abandoned: usize,
}

/// In-flight load waiting for its transport response
struct PendingLoad<T> {
    process: ProcessHandle,
    uri: String,
    kind: String,
    on_success: Box<dyn FnOnce(Arc<T>)>,
    on_error: Box<dyn FnOnce(String)>,
}

/// Asset cache and loader
pub struct AssetManager<T> {
    importers: ImporterRegistry<T>,
    cache: AssetCache<T>,
    /// Waiting table: completion token → load
    pending: HashMap<CallbackToken, PendingLoad<T>>,
    config: AssetConfig,
}

impl<T: 'static> AssetManager<T> {
    /// Create a new asset manager
    pub fn new(config: AssetConfig) -> Self {
        log::info!("Creating AssetManager with config: {:?}", config);
        Self {
            importers: ImporterRegistry::new(),
            cache: AssetCache::new(config.cache_capacity),
            pending: HashMap::new(),
            config,
        }
    }

    /// Register the importer for a content type, replacing any previous one
    pub fn register_importer(&mut self, importer: Importer<T>) -> Result<(), AssetError> {
        self.importers.register(importer)
    }

    /// Registered importers
    pub fn importers(&self) -> &ImporterRegistry<T> {
        &self.importers
    }

    /// Cached asset for `uri`, resetting its age; never starts a load
    pub fn get_asset(&mut self, uri: &str) -> Option<Arc<T>> {
        let asset = self.cache.get(uri);
        if asset.is_some() {
            log::trace!("Cache hit for {}", uri);
        }
        asset
    }

    /// Start loading an asset
    ///
    /// Creates a process in the active scene, issues the fetch and records
    /// the load in the waiting table. Fails without side effects when the
    /// content type has no importer or no scene is active.
    pub fn load_asset(
        &mut self,
        supervisor: &mut ProcessSupervisor,
        transport: &mut dyn Transport,
        request: LoadRequest,
        callbacks: LoadCallbacks<T>,
    ) -> Result<ProcessHandle, AssetError> {
        let LoadRequest {
            uri,
            kind,
            endpoint,
            params,
        } = request;
        let importer = self
            .importers
            .get(&kind)
            .ok_or_else(|| AssetError::UnsupportedType(kind.clone()))?;

        let mut transport_params = importer.transport_params().clone();
        transport_params.extend(params);

        let LoadCallbacks {
            on_success,
            on_timeout,
            on_error,
        } = callbacks;
        let process = supervisor.create_process(
            ProcessSpec::new(format!("Asset load: {uri}"))
                .with_timeout(self.config.load_timeout())
                .on_timeout(on_timeout),
        )?;

        let token = CallbackToken::for_process(&process);
        if self.pending.contains_key(&token) {
            log::warn!("Refusing load of {}: request {} is still in flight", uri, token);
            supervisor.kill_process(&process);
            return Err(AssetError::TokenInUse(token.to_string()));
        }
        log::debug!("Loading {} asset {} as {}", kind, uri, token);
        transport.fetch(TransportRequest {
            token: token.clone(),
            endpoint: endpoint.unwrap_or_else(|| self.config.default_endpoint.clone()),
            uri: uri.clone(),
            params: transport_params,
        });

        self.pending.insert(
            token,
            PendingLoad {
                process: process.clone(),
                uri,
                kind,
                on_success,
                on_error,
            },
        );
        Ok(process)
    }

    /// Deliver transport responses and drop loads whose process has ended
    pub fn poll(&mut self, supervisor: &ProcessSupervisor, transport: &mut dyn Transport) -> PollReport {
        let mut report = PollReport::default();
        for response in transport.poll() {
            self.complete(supervisor, response, &mut report);
        }

        let before = self.pending.len();
        self.pending.retain(|token, load| {
            let alive = supervisor.is_alive(&load.process);
            if !alive {
                log::debug!("Abandoning load of {} ({}): process ended", load.uri, token);
            }
            alive
        });
        report.abandoned = before - self.pending.len();
        report
    }

    fn complete(
        &mut self,
        supervisor: &ProcessSupervisor,
        response: TransportResponse,
        report: &mut PollReport,
    ) {
        let Some(load) = self.pending.remove(&response.token) else {
            log::warn!("Dropping response for unknown request {}", response.token);
            report.stale += 1;
            return;
        };
        if !supervisor.is_alive(&load.process) {
            log::warn!(
                "Dropping late response for {}: process {} already ended",
                load.uri,
                load.process.id()
            );
            report.stale += 1;
            return;
        }

        if response.payload.is_empty() {
            // Process stays alive until its timeout reaps it
            report.failed += 1;
            (load.on_error)(AssetError::EmptyPayload.to_string());
            return;
        }

        let parsed = self
            .importers
            .get(&load.kind)
            .ok_or_else(|| AssetError::UnsupportedType(load.kind.clone()))
            .and_then(|importer| importer.parse(&load.uri, &response.payload));
        match parsed {
            Ok(asset) => {
                let asset = Arc::new(asset);
                self.cache.insert(load.uri.clone(), Arc::clone(&asset));
                log::debug!("Cached asset {}", load.uri);
                report.loaded += 1;
                (load.on_success)(asset);
            }
            Err(e) => {
                log::debug!("Failed to parse {}: {}", load.uri, e);
                report.failed += 1;
                (load.on_error)(e.to_string());
            }
        }
    }

    /// Acknowledge a finished load, retiring its process
    pub fn asset_loaded(&mut self, supervisor: &mut ProcessSupervisor, process: &ProcessHandle) {
        supervisor.kill_process(process);
    }

    /// Number of loads waiting for a transport response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The parsed-asset cache
    pub fn cache(&self) -> &AssetCache<T> {
        &self.cache
    }

    /// Drop every cached asset
    pub fn clear_assets(&mut self) {
        log::debug!("Clearing {} cached asset(s)", self.cache.len());
        self.cache.clear();
    }

    /// Full reset: drops cached assets, keeps importers
    pub fn reset(&mut self) {
        log::info!("Resetting AssetManager");
        self.clear_assets();
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// No importer registered for the content type
    #[error("Asset file type not supported: \"{0}\"")]
    UnsupportedType(String),

    /// Required configuration value missing
    #[error("Asset config missing: {0}")]
    MissingField(&'static str),

    /// Transport answered with nothing
    #[error("server response is empty")]
    EmptyPayload,

    /// Parser rejected the payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Completion token already names an in-flight load
    #[error("Request already in flight: {0}")]
    TokenInUse(String),

    /// Load process could not be created
    #[error(transparent)]
    Process(#[from] ProcessError),
}
