//! Process Supervisor
//!
//! Keeps one [`ProcessGroup`] per scene and reaps the group of a scene each
//! time its traversal pass ends:
//!
//! ```text
//! no group ──SceneCreated──► group active ──SceneDestroyed / Reset──► discarded
//!                               │    ▲
//!                 SceneActivated│    │SceneDeactivated (reap once)
//!                               ▼    │
//!                           scene is active
//! ```
//!
//! Processes can only be created while a scene is active. Time comes from
//! `TimeUpdated` signals, so the supervisor never reads a clock itself.

use std::collections::{BTreeMap, HashMap};

use super::group::{ProcessGroup, ReapReport};
use super::handle::{Process, ProcessDescriptor, ProcessHandle, ProcessId, ProcessSpec};
use super::ProcessError;
use crate::core::config::ProcessConfig;
use crate::events::{ObserverBus, ProcessEvent, ProcessEventKind, ProcessEventMask, ProcessObserver};
use crate::scene::{SceneId, SceneSignal};

/// Registry of in-flight asynchronous work, grouped by scene
pub struct ProcessSupervisor {
    config: ProcessConfig,
    time: f64,
    groups: HashMap<SceneId, ProcessGroup>,
    active_scene: Option<SceneId>,
    observers: ObserverBus,
    /// Serial handed to the next group; never reused, not even across resets
    next_serial: u64,
}

impl ProcessSupervisor {
    /// Create a supervisor with no scenes
    pub fn new(config: ProcessConfig) -> Self {
        log::info!("Creating ProcessSupervisor with config: {:?}", config);
        Self {
            config,
            time: 0.0,
            groups: HashMap::new(),
            active_scene: None,
            observers: ObserverBus::new(),
            next_serial: 0,
        }
    }

    /// Register an observer for the notification kinds in `mask`
    pub fn register_observer(&mut self, mask: ProcessEventMask, observer: Box<dyn ProcessObserver>) {
        self.observers.register(mask, observer);
    }

    /// Dispatch one lifecycle signal
    ///
    /// Returns the reap report when the signal was a deactivation.
    pub fn handle_signal(&mut self, signal: SceneSignal) -> Option<ReapReport> {
        match signal {
            SceneSignal::TimeUpdated(time) => self.time_updated(time),
            SceneSignal::SceneCreated(scene_id) => self.scene_created(scene_id),
            SceneSignal::SceneActivated(scene_id) => self.scene_activated(scene_id),
            SceneSignal::SceneDeactivated => return Some(self.scene_deactivated()),
            SceneSignal::SceneDestroyed(scene_id) => self.scene_destroyed(&scene_id),
            SceneSignal::Reset => self.reset(),
        }
        None
    }

    /// Record the current clock value
    pub fn time_updated(&mut self, time: f64) {
        self.time = time;
    }

    /// Current supervisor time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Create the process group of a new scene
    pub fn scene_created(&mut self, scene_id: SceneId) {
        let group = ProcessGroup::new(scene_id.clone(), self.next_serial);
        self.next_serial += 1;
        if let Some(old) = self.groups.insert(scene_id.clone(), group) {
            log::warn!(
                "Scene {} created twice; discarding {} process(es) of the old group",
                scene_id,
                old.slot_count()
            );
        } else {
            log::debug!("Created process group for scene {}", scene_id);
        }
    }

    /// Make a scene the active one for the duration of its traversal
    pub fn scene_activated(&mut self, scene_id: SceneId) {
        if let Some(previous) = &self.active_scene {
            log::warn!(
                "Scene {} activated while {} is still active; {} will not be reaped",
                scene_id,
                previous,
                previous
            );
        }
        if !self.groups.contains_key(&scene_id) {
            log::warn!("Scene {} activated without a process group", scene_id);
        }
        self.active_scene = Some(scene_id);
    }

    /// End the active scene's traversal and reap its group
    ///
    /// Killed processes are reclaimed, expired ones destroyed. For each
    /// expired process a timed-out notification is published and its timeout
    /// callback invoked, in that order. A panic inside a callback propagates
    /// to the caller; every expired process is already destroyed by then.
    pub fn scene_deactivated(&mut self) -> ReapReport {
        let Some(scene_id) = self.active_scene.take() else {
            log::warn!("Scene deactivated with no active scene");
            return ReapReport::default();
        };
        let Some(group) = self.groups.get_mut(&scene_id) else {
            log::warn!("Scene {} deactivated but has no process group", scene_id);
            return ReapReport::default();
        };

        let (report, expired) = group.reap(self.time);
        if report != ReapReport::default() {
            log::debug!("Reaped scene {}: {:?}", scene_id, report);
        }

        for process in expired {
            log::warn!(
                "Process timed out after {} seconds: {}",
                process.descriptor.timeout,
                process.descriptor.description
            );
            self.publish(ProcessEventKind::TimedOut, process.descriptor);
            if let Some(on_timeout) = process.on_timeout {
                on_timeout();
            }
        }
        report
    }

    /// Discard a scene's process group without firing any callbacks
    pub fn scene_destroyed(&mut self, scene_id: &SceneId) {
        match self.groups.remove(scene_id) {
            Some(group) => log::debug!(
                "Discarded process group of scene {} ({} live)",
                scene_id,
                group.live_count()
            ),
            None => log::warn!("Destroyed unknown scene {}", scene_id),
        }
        if self.active_scene.as_ref() == Some(scene_id) {
            self.active_scene = None;
        }
    }

    /// Discard every process group
    pub fn reset(&mut self) {
        log::info!("Resetting ProcessSupervisor ({} scene(s))", self.groups.len());
        self.groups.clear();
        self.active_scene = None;
    }

    /// Currently active scene, if any
    pub fn active_scene(&self) -> Option<&SceneId> {
        self.active_scene.as_ref()
    }

    /// Scenes that currently have a process group
    pub fn scene_ids(&self) -> impl Iterator<Item = &SceneId> {
        self.groups.keys()
    }

    /// Create a process in the active scene's group
    pub fn create_process(&mut self, spec: ProcessSpec) -> Result<ProcessHandle, ProcessError> {
        let scene_id = self.active_scene.clone().ok_or(ProcessError::NoActiveScene)?;
        let group = self
            .groups
            .get_mut(&scene_id)
            .ok_or_else(|| ProcessError::UnknownScene(scene_id.clone()))?;

        let ProcessSpec {
            description,
            timeout,
            on_timeout,
        } = spec;
        let id = group.next_id();
        let serial = group.serial();
        let process = Process::new(
            scene_id.clone(),
            id,
            self.time,
            description,
            timeout.unwrap_or_else(|| self.config.default_timeout()),
            on_timeout,
        );
        let descriptor = process.descriptor();
        let key = group.insert(process);

        log::debug!("Created process {} in scene {}: {}", id, scene_id, descriptor.description);
        self.publish(ProcessEventKind::Created, descriptor);

        Ok(ProcessHandle {
            scene_id,
            group: serial,
            key,
            id,
        })
    }

    /// Kill a process
    ///
    /// No-op when the process is already destroyed or its scene is gone,
    /// including a scene since created again under the same id.
    /// The slot is reclaimed on the scene's next reap. Needs no active scene.
    pub fn kill_process(&mut self, handle: &ProcessHandle) {
        let Some(group) = self
            .groups
            .get_mut(handle.scene_id())
            .filter(|group| group.serial() == handle.group_serial())
        else {
            return;
        };
        if let Some(descriptor) = group.kill(handle.key()) {
            log::debug!("Killed process {} in scene {}", handle.id(), handle.scene_id());
            self.publish(ProcessEventKind::Killed, descriptor);
        }
    }

    /// Read-only view of a process that has not been reaped yet
    pub fn process(&self, handle: &ProcessHandle) -> Option<&Process> {
        self.groups
            .get(handle.scene_id())
            .filter(|group| group.serial() == handle.group_serial())?
            .get(handle.key())
    }

    /// Whether the process is neither killed nor timed out
    pub fn is_alive(&self, handle: &ProcessHandle) -> bool {
        self.process(handle).is_some_and(|process| !process.is_destroyed())
    }

    /// Live process count of the named scene, or of the active scene
    ///
    /// Zero when no scene is named or active, or the scene has no group.
    pub fn num_processes(&self, scene_id: Option<&SceneId>) -> usize {
        self.group(scene_id).map_or(0, ProcessGroup::live_count)
    }

    /// Live processes of the named scene, or of the active scene
    pub fn processes(&self, scene_id: Option<&SceneId>) -> BTreeMap<ProcessId, &Process> {
        self.group(scene_id)
            .map(|group| {
                group
                    .live_processes()
                    .map(|process| (process.id(), process))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn group(&self, scene_id: Option<&SceneId>) -> Option<&ProcessGroup> {
        let scene_id = scene_id.or(self.active_scene.as_ref())?;
        self.groups.get(scene_id)
    }

    fn publish(&mut self, kind: ProcessEventKind, descriptor: ProcessDescriptor) {
        let event = ProcessEvent::new(kind, descriptor, self.time);
        self.observers.publish(&event);
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(ProcessConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Timeout;
    use approx::assert_relative_eq;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<ProcessEvent>>>,
    }

    impl Recorder {
        fn kinds(&self) -> Vec<ProcessEventKind> {
            self.events.borrow().iter().map(|event| event.kind).collect()
        }

        fn count(&self, kind: ProcessEventKind) -> usize {
            self.events.borrow().iter().filter(|event| event.kind == kind).count()
        }
    }

    impl ProcessObserver for Recorder {
        fn on_event(&mut self, event: &ProcessEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    fn supervisor_with_scene(scene: &str) -> (ProcessSupervisor, Recorder) {
        let mut supervisor = ProcessSupervisor::default();
        let recorder = Recorder::default();
        supervisor.register_observer(ProcessEventMask::all(), Box::new(recorder.clone()));
        supervisor.scene_created(SceneId::new(scene));
        supervisor.scene_activated(SceneId::new(scene));
        (supervisor, recorder)
    }

    #[test]
    fn test_create_requires_active_scene() {
        let mut supervisor = ProcessSupervisor::default();
        let result = supervisor.create_process(ProcessSpec::new("load"));
        assert_eq!(result.unwrap_err(), ProcessError::NoActiveScene);

        supervisor.scene_created(SceneId::new("s1"));
        let result = supervisor.create_process(ProcessSpec::new("load"));
        assert_eq!(result.unwrap_err(), ProcessError::NoActiveScene);
    }

    #[test]
    fn test_create_in_scene_without_group() {
        let mut supervisor = ProcessSupervisor::default();
        supervisor.scene_activated(SceneId::new("ghost"));
        let result = supervisor.create_process(ProcessSpec::new("load"));
        assert_eq!(result.unwrap_err(), ProcessError::UnknownScene(SceneId::new("ghost")));
    }

    #[test]
    fn test_ids_distinct_and_count_tracks_kills() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let mut handles = Vec::new();
        for i in 0..5 {
            handles.push(supervisor.create_process(ProcessSpec::new(format!("load {i}"))).unwrap());
        }

        let ids: HashSet<_> = handles.iter().map(ProcessHandle::id).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(supervisor.num_processes(None), 5);

        supervisor.kill_process(&handles[1]);
        supervisor.kill_process(&handles[3]);
        assert_eq!(supervisor.num_processes(None), 3);
        assert_eq!(supervisor.processes(None).len(), 3);

        // More creations in the same pass never reuse a killed id
        let extra = supervisor.create_process(ProcessSpec::new("extra")).unwrap();
        assert_eq!(extra.id(), ProcessId(5));
        assert_eq!(supervisor.num_processes(None), 4);
        assert_eq!(recorder.count(ProcessEventKind::Created), 6);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let handle = supervisor.create_process(ProcessSpec::new("load")).unwrap();

        supervisor.kill_process(&handle);
        supervisor.kill_process(&handle);

        assert_eq!(recorder.count(ProcessEventKind::Killed), 1);
        assert!(!supervisor.is_alive(&handle));
        // Still visible until the next reap
        assert!(supervisor.process(&handle).is_some_and(Process::is_destroyed));
    }

    #[test]
    fn test_kill_without_active_scene() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let handle = supervisor.create_process(ProcessSpec::new("load")).unwrap();
        supervisor.scene_deactivated();

        supervisor.kill_process(&handle);
        assert_eq!(recorder.count(ProcessEventKind::Killed), 1);
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("s1"))), 0);
    }

    #[test]
    fn test_killed_slot_reclaimed_on_reap() {
        let (mut supervisor, _recorder) = supervisor_with_scene("s1");
        let handle = supervisor.create_process(ProcessSpec::new("load")).unwrap();
        supervisor.kill_process(&handle);

        let report = supervisor.scene_deactivated();
        assert_eq!(report.reclaimed, 1);
        assert!(supervisor.process(&handle).is_none());

        // Reclaimed id is free again, but the old handle stays dead
        supervisor.scene_activated(SceneId::new("s1"));
        let fresh = supervisor.create_process(ProcessSpec::new("again")).unwrap();
        assert_eq!(fresh.id(), handle.id());
        assert!(supervisor.is_alive(&fresh));
        assert!(!supervisor.is_alive(&handle));
    }

    #[test]
    fn test_timeout_scenario() {
        let (mut supervisor, recorder) = supervisor_with_scene("S1");
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);

        supervisor.time_updated(0.0);
        let handle = supervisor
            .create_process(
                ProcessSpec::new("slow load")
                    .with_timeout(Timeout::After(1.0))
                    .on_timeout(move || counter.set(counter.get() + 1)),
            )
            .unwrap();

        supervisor.time_updated(0.5);
        let report = supervisor.scene_deactivated();
        assert_eq!(report.still_running, 1);
        assert!(supervisor.is_alive(&handle));
        assert_relative_eq!(supervisor.process(&handle).unwrap().time_running(), 0.5);

        supervisor.scene_activated(SceneId::new("S1"));
        supervisor.time_updated(1.2);
        let report = supervisor.scene_deactivated();
        assert_eq!(report.timed_out, 1);
        assert!(!supervisor.is_alive(&handle));
        assert_eq!(fired.get(), 1);
        assert_eq!(recorder.count(ProcessEventKind::TimedOut), 1);
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("S1"))), 0);

        // Nothing left to time out
        supervisor.scene_activated(SceneId::new("S1"));
        supervisor.time_updated(5.0);
        supervisor.scene_deactivated();
        assert_eq!(fired.get(), 1);
        assert_eq!(recorder.count(ProcessEventKind::TimedOut), 1);
    }

    #[test]
    fn test_never_timeout_survives() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let handle = supervisor
            .create_process(ProcessSpec::new("forever").with_timeout(Timeout::from_secs(-1.0)))
            .unwrap();

        supervisor.time_updated(1.0e9);
        supervisor.scene_deactivated();
        assert!(supervisor.is_alive(&handle));
        assert_eq!(recorder.count(ProcessEventKind::TimedOut), 0);
    }

    #[test]
    fn test_default_timeout_from_config() {
        let mut supervisor = ProcessSupervisor::new(ProcessConfig::new().with_default_timeout(2.0));
        supervisor.scene_created(SceneId::new("s1"));
        supervisor.scene_activated(SceneId::new("s1"));
        let handle = supervisor.create_process(ProcessSpec::new("load")).unwrap();
        assert_eq!(supervisor.process(&handle).unwrap().timeout(), Timeout::After(2.0));
    }

    #[test]
    fn test_reap_only_touches_deactivated_scene() {
        let mut supervisor = ProcessSupervisor::default();
        supervisor.scene_created(SceneId::new("a"));
        supervisor.scene_created(SceneId::new("b"));

        supervisor.scene_activated(SceneId::new("a"));
        let in_a = supervisor
            .create_process(ProcessSpec::new("a").with_timeout(Timeout::After(1.0)))
            .unwrap();
        supervisor.scene_deactivated();

        supervisor.scene_activated(SceneId::new("b"));
        supervisor.time_updated(10.0);
        supervisor.scene_deactivated();

        assert!(supervisor.is_alive(&in_a));
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("a"))), 1);
    }

    #[test]
    fn test_query_defaults_to_active_scene() {
        let (mut supervisor, _recorder) = supervisor_with_scene("s1");
        supervisor.create_process(ProcessSpec::new("load")).unwrap();
        assert_eq!(supervisor.num_processes(None), 1);
        assert_eq!(supervisor.processes(None).len(), 1);

        supervisor.scene_deactivated();
        assert_eq!(supervisor.num_processes(None), 0);
        assert!(supervisor.processes(None).is_empty());
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("s1"))), 1);
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("nope"))), 0);
    }

    #[test]
    fn test_destroy_and_reset_discard_groups() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let handle = supervisor
            .create_process(ProcessSpec::new("load").on_timeout(move || flag.set(true)))
            .unwrap();

        supervisor.scene_destroyed(&SceneId::new("s1"));
        assert!(supervisor.active_scene().is_none());
        assert!(supervisor.process(&handle).is_none());
        assert_eq!(supervisor.num_processes(Some(&SceneId::new("s1"))), 0);

        // Killing a process of a destroyed scene is silent
        supervisor.kill_process(&handle);
        assert_eq!(recorder.count(ProcessEventKind::Killed), 0);
        assert!(!fired.get());

        supervisor.scene_created(SceneId::new("s2"));
        supervisor.scene_activated(SceneId::new("s2"));
        supervisor.reset();
        assert!(supervisor.active_scene().is_none());
        assert_eq!(supervisor.scene_ids().count(), 0);
    }

    #[test]
    fn test_recreated_scene_ignores_old_handles() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let old = supervisor.create_process(ProcessSpec::new("old")).unwrap();

        supervisor.scene_destroyed(&SceneId::new("s1"));
        supervisor.scene_created(SceneId::new("s1"));
        supervisor.scene_activated(SceneId::new("s1"));
        let new = supervisor.create_process(ProcessSpec::new("new")).unwrap();

        // Same scene, id and slot, different group
        assert_eq!(old.id(), new.id());
        assert_ne!(old, new);
        assert!(!supervisor.is_alive(&old));
        assert!(supervisor.process(&old).is_none());

        supervisor.kill_process(&old);
        assert!(supervisor.is_alive(&new));
        assert_eq!(recorder.count(ProcessEventKind::Killed), 0);
        assert_eq!(supervisor.num_processes(None), 1);
    }

    #[test]
    fn test_deactivate_without_active_scene() {
        let mut supervisor = ProcessSupervisor::default();
        assert_eq!(supervisor.scene_deactivated(), ReapReport::default());
    }

    #[test]
    fn test_handle_signal_dispatch() {
        let mut supervisor = ProcessSupervisor::default();
        assert!(supervisor.handle_signal(SceneSignal::SceneCreated(SceneId::new("s"))).is_none());
        supervisor.handle_signal(SceneSignal::SceneActivated(SceneId::new("s")));
        supervisor.handle_signal(SceneSignal::TimeUpdated(3.0));
        assert_relative_eq!(supervisor.time(), 3.0);

        let handle = supervisor.create_process(ProcessSpec::new("load")).unwrap();
        assert_relative_eq!(supervisor.process(&handle).unwrap().time_started(), 3.0);

        let report = supervisor.handle_signal(SceneSignal::SceneDeactivated);
        assert_eq!(report, Some(ReapReport { reclaimed: 0, timed_out: 0, still_running: 1 }));
        assert!(supervisor.active_scene().is_none());
    }

    #[test]
    fn test_event_order_for_timeout() {
        let (mut supervisor, recorder) = supervisor_with_scene("s1");
        let events = Rc::clone(&recorder.events);
        supervisor
            .create_process(
                ProcessSpec::new("load")
                    .with_timeout(Timeout::After(0.0))
                    // Notification is published before the callback runs
                    .on_timeout(move || assert_eq!(events.borrow().len(), 2)),
            )
            .unwrap();
        supervisor.scene_deactivated();
        assert_eq!(recorder.kinds(), vec![ProcessEventKind::Created, ProcessEventKind::TimedOut]);
    }
}
