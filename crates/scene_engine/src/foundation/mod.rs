//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Clock sources and frame timing
//! - Collections and data structures
//! - Logging utilities

pub mod collections;
pub mod time;
pub mod logging;
