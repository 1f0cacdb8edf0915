//! Scene identity and lifecycle signalling
//!
//! The traversal engine itself lives outside this crate. What the core needs
//! from it is a stream of lifecycle signals:
//!
//! ```text
//! SceneCreated(id) ──► SceneActivated(id) ──► [traversal pass] ──► SceneDeactivated
//!                            ▲                                           │
//!                            └────────────── next frame ◄────────────────┘
//! SceneDestroyed(id) / Reset end the scene's process group.
//! ```
//!
//! Signals are delivered either as direct calls on the supervisor or through
//! a [`SignalQueue`] drained once per frame.

mod signal;

pub use signal::{SceneSignal, SignalQueue};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scene, unique among live scenes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(String);

impl SceneId {
    /// Create a scene id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SceneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
