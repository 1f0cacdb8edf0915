//! Application trait and lifecycle management

use crate::assets::AssetError;
use crate::engine::Engine;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive scenes with the engine.
pub trait Application {
    /// Parsed asset type the application's importers produce
    type Asset: 'static;

    /// Initialize the application
    ///
    /// Called once after the engine is initialized. Use this to register
    /// importers and create the initial scenes.
    fn initialize(&mut self, engine: &mut Engine<Self::Asset>) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame after the engine has delivered time, signals and
    /// transport responses. Scene traversals belong here.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine<Self::Asset>, delta_time: f64) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called when the main loop ends.
    fn cleanup(&mut self, engine: &mut Engine<Self::Asset>);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}
