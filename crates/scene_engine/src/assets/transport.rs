//! Transport abstraction for cross-domain content fetches
//!
//! A transport takes a [`TransportRequest`] and later reports a
//! [`TransportResponse`] carrying the same [`CallbackToken`], at most once.
//! A transport-level failure produces no response at all; the process
//! supervisor's timeout is what eventually notices.
//!
//! ```text
//! AssetManager ──fetch(request)──► Transport ──...──► poll() ──► [response{token, payload}]
//!       ▲                                                              │
//!       └────────────── waiting table lookup by token ◄────────────────┘
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use url::form_urlencoded;

use crate::foundation::collections::key_bits;
use crate::process::ProcessHandle;

/// Completion token naming one in-flight request
///
/// Built from the scene id, the process id, the serial of the scene's
/// process group and the process slot's generation, so no two in-flight
/// loads share a token, even across scenes, after a timed-out process's slot
/// has been reused, or after the scene was destroyed and created again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackToken(String);

impl CallbackToken {
    /// Token for the load supervised by `process`
    pub fn for_process(process: &ProcessHandle) -> Self {
        Self(format!(
            "callback_{}_{}_{}_{:x}",
            process.scene_id(),
            process.id(),
            process.group_serial(),
            key_bits(process.key())
        ))
    }

    /// The token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fetch to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Completion token echoed back in the response
    pub token: CallbackToken,
    /// Proxy or server endpoint; empty for a same-domain fetch
    pub endpoint: String,
    /// Location of the content
    pub uri: String,
    /// Importer-specific parameters
    pub params: BTreeMap<String, String>,
}

impl TransportRequest {
    /// Query string: `callback=<token>&uri=<uri>` followed by the parameters in key order
    pub fn query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("callback", self.token.as_str());
        query.append_pair("uri", &self.uri);
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        query.finish()
    }

    /// Full request URL: `<endpoint>?<query>`
    pub fn url(&self) -> String {
        format!("{}?{}", self.endpoint, self.query())
    }
}

/// Completed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Token of the request this answers
    pub token: CallbackToken,
    /// Raw content; empty when the server answered with nothing
    pub payload: Vec<u8>,
}

/// Cross-domain fetch capability
pub trait Transport {
    /// Start a fetch; never blocks
    fn fetch(&mut self, request: TransportRequest);

    /// Take the responses that arrived since the last poll
    fn poll(&mut self) -> Vec<TransportResponse>;
}

/// In-memory transport completed by the host
///
/// Records every request it is given. The host answers with
/// [`QueuedTransport::respond`] or drops a request with
/// [`QueuedTransport::drop_request`], which models a silent transport failure.
#[derive(Debug, Default)]
pub struct QueuedTransport {
    issued: Vec<TransportRequest>,
    outstanding: BTreeMap<CallbackToken, TransportRequest>,
    ready: VecDeque<TransportResponse>,
}

impl QueuedTransport {
    /// Create an idle transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request ever issued, oldest first
    pub fn requests(&self) -> &[TransportRequest] {
        &self.issued
    }

    /// Requests not yet answered or dropped
    pub fn outstanding(&self) -> impl Iterator<Item = &TransportRequest> {
        self.outstanding.values()
    }

    /// Answer an outstanding request; `false` if the token is not outstanding
    pub fn respond(&mut self, token: &CallbackToken, payload: impl Into<Vec<u8>>) -> bool {
        if self.outstanding.remove(token).is_none() {
            return false;
        }
        self.ready.push_back(TransportResponse {
            token: token.clone(),
            payload: payload.into(),
        });
        true
    }

    /// Answer every outstanding request for `uri`, returning how many were answered
    pub fn respond_uri(&mut self, uri: &str, payload: &[u8]) -> usize {
        let tokens: Vec<CallbackToken> = self
            .outstanding
            .values()
            .filter(|request| request.uri == uri)
            .map(|request| request.token.clone())
            .collect();
        for token in &tokens {
            self.respond(token, payload.to_vec());
        }
        tokens.len()
    }

    /// Forget an outstanding request without ever answering it
    pub fn drop_request(&mut self, token: &CallbackToken) -> bool {
        self.outstanding.remove(token).is_some()
    }
}

impl Transport for QueuedTransport {
    fn fetch(&mut self, request: TransportRequest) {
        log::trace!("Queued fetch {}", request.url());
        self.outstanding.insert(request.token.clone(), request.clone());
        self.issued.push(request);
    }

    fn poll(&mut self) -> Vec<TransportResponse> {
        self.ready.drain(..).collect()
    }
}
