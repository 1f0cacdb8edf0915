//! Per-scene process group
//!
//! Processes live in a generation-counted slot map. Killing a process only
//! flags it; the slot is reclaimed on the next reap pass, which keeps kills
//! O(1) for the caller and lets stale handles fail lookups cleanly.

use std::collections::HashMap;

use super::handle::{Process, ProcessDescriptor, ProcessId, TimeoutCallback};
use crate::foundation::collections::{HandleMap, ProcessKey};
use crate::scene::SceneId;

/// Outcome of one reap pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Slots of previously killed processes freed by this pass
    pub reclaimed: usize,
    /// Processes destroyed because they exceeded their timeout
    pub timed_out: usize,
    /// Processes left alive with an updated running time
    pub still_running: usize,
}

/// Process destroyed by the reaper, handed back for notification
pub(crate) struct Expired {
    pub descriptor: ProcessDescriptor,
    pub on_timeout: Option<TimeoutCallback>,
}

/// The set of processes belonging to one scene
#[derive(Debug)]
pub struct ProcessGroup {
    scene_id: SceneId,
    serial: u64,
    processes: HandleMap<Process>,
    ids: HashMap<ProcessId, ProcessKey>,
    live: usize,
}

impl ProcessGroup {
    /// Create an empty group for a scene
    ///
    /// `serial` tells this group apart from earlier groups of the same scene.
    pub fn new(scene_id: SceneId, serial: u64) -> Self {
        Self {
            scene_id,
            serial,
            processes: HandleMap::with_key(),
            ids: HashMap::new(),
            live: 0,
        }
    }

    /// Scene this group belongs to
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Supervisor-wide serial of this group
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Number of processes that are neither killed nor timed out
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of occupied slots, including killed processes awaiting reclamation
    pub fn slot_count(&self) -> usize {
        self.processes.len()
    }

    /// Lowest id not held by any occupied slot
    pub fn next_id(&self) -> ProcessId {
        let mut suffix = 0;
        while self.ids.contains_key(&ProcessId(suffix)) {
            suffix += 1;
        }
        ProcessId(suffix)
    }

    /// Register a live process
    pub(crate) fn insert(&mut self, process: Process) -> ProcessKey {
        let id = process.id();
        let key = self.processes.insert(process);
        self.ids.insert(id, key);
        self.live += 1;
        key
    }

    /// Look up a process by key
    pub fn get(&self, key: ProcessKey) -> Option<&Process> {
        self.processes.get(key)
    }

    /// Flag a process as destroyed; `None` if it was already dead or gone
    pub(crate) fn kill(&mut self, key: ProcessKey) -> Option<ProcessDescriptor> {
        let process = self.processes.get_mut(key)?;
        if process.is_destroyed() {
            return None;
        }
        process.mark_destroyed();
        self.live -= 1;
        Some(process.descriptor())
    }

    /// Processes that are neither killed nor timed out
    pub fn live_processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values().filter(|process| !process.is_destroyed())
    }

    /// Sweep the group at time `now`
    ///
    /// Killed processes have their slots reclaimed. Processes whose timeout
    /// has elapsed are destroyed, reclaimed and returned so the caller can
    /// notify observers and fire their callbacks. Everything else gets its
    /// running time refreshed.
    pub(crate) fn reap(&mut self, now: f64) -> (ReapReport, Vec<Expired>) {
        let mut report = ReapReport::default();
        let mut expired = Vec::new();
        let Self {
            processes,
            ids,
            live,
            ..
        } = self;

        processes.retain(|_, process| {
            if process.is_destroyed() {
                ids.remove(&process.id());
                report.reclaimed += 1;
                return false;
            }

            let elapsed = now - process.time_started();
            if process.timeout().is_expired(elapsed) {
                process.mark_destroyed();
                ids.remove(&process.id());
                *live -= 1;
                report.timed_out += 1;
                expired.push(Expired {
                    descriptor: process.descriptor(),
                    on_timeout: process.take_on_timeout(),
                });
                false
            } else {
                log::trace!(
                    "Process {} in scene {} running for {:.3}s",
                    process.id(),
                    process.scene_id(),
                    elapsed
                );
                process.set_time_running(elapsed);
                report.still_running += 1;
                true
            }
        });

        (report, expired)
    }
}
