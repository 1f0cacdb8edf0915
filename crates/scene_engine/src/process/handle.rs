//! Process records, handles and timeouts

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::collections::ProcessKey;
use crate::scene::SceneId;

/// Callback fired once when the reaper destroys a process on timeout
pub type TimeoutCallback = Box<dyn FnOnce()>;

/// Process timeout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Timeout {
    /// The reaper never destroys the process
    Never,
    /// Destroyed once this many seconds have elapsed since it started
    After(f64),
}

impl Timeout {
    /// Default timeout in seconds
    pub const DEFAULT_SECS: f64 = 30.0;

    /// Sentinel-style conversion: negative or non-finite seconds mean [`Timeout::Never`]
    pub fn from_secs(secs: f64) -> Self {
        if secs.is_finite() && secs >= 0.0 {
            Self::After(secs)
        } else {
            Self::Never
        }
    }

    /// Whether a process running for `elapsed` seconds has exceeded this timeout
    pub fn is_expired(self, elapsed: f64) -> bool {
        match self {
            Self::Never => false,
            Self::After(limit) => elapsed >= limit,
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::After(Self::DEFAULT_SECS)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::After(secs) => write!(f, "{secs}s"),
        }
    }
}

/// Process id, unique among the live processes of one scene group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a supervised process
///
/// Handles only grant read access through the supervisor. Once the process
/// has been reaped, or its scene destroyed, the handle resolves to nothing,
/// even if its slot has been reused by a newer process or the scene has been
/// created again under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pub(crate) scene_id: SceneId,
    pub(crate) group: u64,
    pub(crate) key: ProcessKey,
    pub(crate) id: ProcessId,
}

impl ProcessHandle {
    /// Scene owning the process
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Process id within its scene
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Serial of the process group that issued the handle
    pub fn group_serial(&self) -> u64 {
        self.group
    }

    pub(crate) fn key(&self) -> ProcessKey {
        self.key
    }
}

/// What a caller asks for when creating a process
pub struct ProcessSpec {
    pub(crate) description: String,
    pub(crate) timeout: Option<Timeout>,
    pub(crate) on_timeout: Option<TimeoutCallback>,
}

impl ProcessSpec {
    /// Describe a new unit of work; timeout defaults to the supervisor's
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timeout: None,
            on_timeout: None,
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the callback fired when the process times out
    pub fn on_timeout(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_timeout = Some(Box::new(callback));
        self
    }
}

/// Snapshot of a process carried by notifications
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDescriptor {
    /// Scene owning the process
    pub scene_id: SceneId,
    /// Process id within the scene
    pub id: ProcessId,
    /// Supervisor time when the process was created
    pub time_started: f64,
    /// Human-readable description
    pub description: String,
    /// Configured timeout
    pub timeout: Timeout,
}

/// One supervised unit of asynchronous work
pub struct Process {
    scene_id: SceneId,
    id: ProcessId,
    time_started: f64,
    time_running: f64,
    description: String,
    timeout: Timeout,
    on_timeout: Option<TimeoutCallback>,
    destroyed: bool,
}

impl Process {
    pub(crate) fn new(
        scene_id: SceneId,
        id: ProcessId,
        time_started: f64,
        description: String,
        timeout: Timeout,
        on_timeout: Option<TimeoutCallback>,
    ) -> Self {
        Self {
            scene_id,
            id,
            time_started,
            time_running: 0.0,
            description,
            timeout,
            on_timeout,
            destroyed: false,
        }
    }

    /// Scene owning the process
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Process id within the scene
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Supervisor time when the process was created
    pub fn time_started(&self) -> f64 {
        self.time_started
    }

    /// Elapsed time measured at the last reap that left the process alive
    pub fn time_running(&self) -> f64 {
        self.time_running
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Configured timeout
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Whether the process was killed or timed out
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Snapshot for notifications
    pub fn descriptor(&self) -> ProcessDescriptor {
        ProcessDescriptor {
            scene_id: self.scene_id.clone(),
            id: self.id,
            time_started: self.time_started,
            description: self.description.clone(),
            timeout: self.timeout,
        }
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn set_time_running(&mut self, elapsed: f64) {
        self.time_running = elapsed;
    }

    pub(crate) fn take_on_timeout(&mut self) -> Option<TimeoutCallback> {
        self.on_timeout.take()
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("scene_id", &self.scene_id)
            .field("id", &self.id)
            .field("time_started", &self.time_started)
            .field("time_running", &self.time_running)
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .field("has_on_timeout", &self.on_timeout.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_sentinel() {
        assert_eq!(Timeout::from_secs(-1.0), Timeout::Never);
        assert_eq!(Timeout::from_secs(f64::NAN), Timeout::Never);
        assert_eq!(Timeout::from_secs(0.0), Timeout::After(0.0));
        assert_eq!(Timeout::default(), Timeout::After(30.0));
    }

    #[test]
    fn test_timeout_expiry_boundary() {
        let timeout = Timeout::After(1.0);
        assert!(!timeout.is_expired(0.999));
        assert!(timeout.is_expired(1.0));
        assert!(timeout.is_expired(1.2));
        assert!(!Timeout::Never.is_expired(f64::MAX));
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(Timeout::After(2.5).to_string(), "2.5s");
        assert_eq!(Timeout::Never.to_string(), "never");
    }
}
