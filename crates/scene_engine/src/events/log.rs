//! Logging observer for process notifications
//!
//! Output format:
//! ```text
//! [process-created] scene=main id=0 timeout=30s desc="Asset load: ship.geo"
//! [process-timed-out] scene=main id=0 timeout=30s desc="Asset load: ship.geo"
//! ```

use super::{ProcessEvent, ProcessEventKind, ProcessObserver};

/// Writes process notifications to the `log` facade
///
/// Timeouts are logged at `warn`, everything else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProcessObserver for LogObserver {
    fn on_event(&mut self, event: &ProcessEvent) {
        let process = &event.process;
        let level = match event.kind {
            ProcessEventKind::TimedOut => ::log::Level::Warn,
            ProcessEventKind::Created | ProcessEventKind::Killed => ::log::Level::Debug,
        };
        ::log::log!(
            level,
            "[{}] scene={} id={} timeout={} desc={:?}",
            event.kind.label(),
            process.scene_id,
            process.id,
            process.timeout,
            process.description
        );
    }
}
