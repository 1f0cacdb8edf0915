//! Supervision of out-of-band asynchronous work
//!
//! Every scene owns a process group. A process is one unit of work that can
//! outlive a traversal pass (an asset fetch, typically): it is created while
//! its scene is active, ended by its owner through
//! [`ProcessSupervisor::kill_process`], or destroyed by the reaper once its
//! timeout elapses.

mod group;
mod handle;
mod supervisor;

pub use group::{ProcessGroup, ReapReport};
pub use handle::{
    Process, ProcessDescriptor, ProcessHandle, ProcessId, ProcessSpec, Timeout, TimeoutCallback,
};
pub use supervisor::ProcessSupervisor;

use thiserror::Error;

use crate::scene::SceneId;

/// Process supervision errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Processes can only be created during a scene's traversal
    #[error("No scene active - can't create process")]
    NoActiveScene,

    /// The active scene was never created
    #[error("No process group for scene: {0}")]
    UnknownScene(SceneId),
}
