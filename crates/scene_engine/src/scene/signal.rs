//! Typed scene lifecycle signals with FIFO delivery

use std::collections::VecDeque;

use super::SceneId;

/// Lifecycle signal consumed by the process supervisor
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSignal {
    /// Clock sample in seconds
    TimeUpdated(f64),
    /// Scene defined; a process group is created for it
    SceneCreated(SceneId),
    /// Traversal of the scene begins
    SceneActivated(SceneId),
    /// Traversal of the active scene ended; its group is reaped
    SceneDeactivated,
    /// Scene destroyed; its process group is discarded
    SceneDestroyed(SceneId),
    /// Framework reset; every group is discarded
    Reset,
}

/// Queue of lifecycle signals
///
/// Signals are delivered in the order they were sent, so one
/// `SceneDeactivated` always produces exactly one reap of the scene activated
/// before it.
#[derive(Debug, Default)]
pub struct SignalQueue {
    pending: VecDeque<SceneSignal>,
}

impl SignalQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a signal for the next drain
    pub fn send(&mut self, signal: SceneSignal) {
        self.pending.push_back(signal);
    }

    /// Take every queued signal, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = SceneSignal> + '_ {
        self.pending.drain(..)
    }

    /// Number of queued signals
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every queued signal
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
