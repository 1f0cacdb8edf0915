//! Transport serving content from a local directory
//!
//! Useful for running scenes offline: a fetch of `models/ship.geo` reads
//! `<root>/models/ship.geo` and completes on the next poll. The endpoint
//! and parameters are ignored. An unreadable file is a transport failure,
//! so the request never completes and the load runs into its timeout.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};

use super::transport::{Transport, TransportRequest, TransportResponse};

/// File-system backed transport
pub struct FileTransport {
    root: PathBuf,
    ready: VecDeque<TransportResponse>,
}

impl FileTransport {
    /// Serve files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ready: VecDeque::new(),
        }
    }

    /// Directory files are served from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URI to a path below the root; `None` if it would escape it
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let relative = Path::new(uri.trim_start_matches('/'));
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}

impl Transport for FileTransport {
    fn fetch(&mut self, request: TransportRequest) {
        let Some(path) = self.resolve(&request.uri) else {
            log::warn!("Refusing to fetch {} outside {}", request.uri, self.root.display());
            return;
        };
        match std::fs::read(&path) {
            Ok(payload) => {
                log::debug!("Read {} bytes from {}", payload.len(), path.display());
                self.ready.push_back(TransportResponse {
                    token: request.token,
                    payload,
                });
            }
            Err(e) => log::warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    fn poll(&mut self) -> Vec<TransportResponse> {
        self.ready.drain(..).collect()
    }
}
