//! Process notifications
//!
//! The supervisor publishes a [`ProcessEvent`] whenever a process is created,
//! killed or reaped on timeout. Delivery is fire-and-forget:
//! - Observers register with a [`ProcessEventMask`] (only notify interested observers)
//! - Every matching observer sees every event, in registration order
//! - Observers cannot veto or consume an event

mod log;

pub use self::log::LogObserver;

use bitflags::bitflags;

use crate::process::ProcessDescriptor;

/// Kind of process notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessEventKind {
    /// Process registered with its scene's group
    Created,
    /// Process killed by its owner
    Killed,
    /// Process destroyed by the reaper after exceeding its timeout
    TimedOut,
}

impl ProcessEventKind {
    /// Mask bit selecting this kind
    pub fn mask(self) -> ProcessEventMask {
        match self {
            Self::Created => ProcessEventMask::CREATED,
            Self::Killed => ProcessEventMask::KILLED,
            Self::TimedOut => ProcessEventMask::TIMED_OUT,
        }
    }

    /// Short label used in log output
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "process-created",
            Self::Killed => "process-killed",
            Self::TimedOut => "process-timed-out",
        }
    }
}

bitflags! {
    /// Selects which process notifications an observer receives
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProcessEventMask: u8 {
        /// Process created
        const CREATED = 0b001;
        /// Process killed
        const KILLED = 0b010;
        /// Process timed out
        const TIMED_OUT = 0b100;
    }
}

/// Notification published by the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEvent {
    /// Type of event
    pub kind: ProcessEventKind,
    /// Snapshot of the process the event is about
    pub process: ProcessDescriptor,
    /// Supervisor time when the event was published (seconds)
    pub timestamp: f64,
}

impl ProcessEvent {
    /// Create a new event
    pub fn new(kind: ProcessEventKind, process: ProcessDescriptor, timestamp: f64) -> Self {
        Self {
            kind,
            process,
            timestamp,
        }
    }
}

/// Receiver of process notifications
pub trait ProcessObserver {
    /// Handle one notification
    fn on_event(&mut self, event: &ProcessEvent);
}

/// Registration table of process observers
#[derive(Default)]
pub struct ObserverBus {
    observers: Vec<(ProcessEventMask, Box<dyn ProcessObserver>)>,
}

impl ObserverBus {
    /// Create a bus with no observers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for the kinds selected by `mask`
    pub fn register(&mut self, mask: ProcessEventMask, observer: Box<dyn ProcessObserver>) {
        self.observers.push((mask, observer));
    }

    /// Deliver an event to every observer interested in its kind
    pub fn publish(&mut self, event: &ProcessEvent) {
        let bit = event.kind.mask();
        for (mask, observer) in &mut self.observers {
            if mask.contains(bit) {
                observer.on_event(event);
            }
        }
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
