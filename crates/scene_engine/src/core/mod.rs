//! # Core Engine Module
//!
//! This module contains the core engine functionality and shared abstractions
//! that are used throughout the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration system for all engine subsystems
//! - **Foundation**: Low-level utilities (clocks, collections, logging)
//! - **Process**: Supervision of asynchronous work per scene
//! - **Assets**: Asset fetching, parsing and caching

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::assets;
pub use crate::process;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    EngineConfig,
    ProcessConfig,
    AssetConfig,
    Config,
    ConfigError,
};
