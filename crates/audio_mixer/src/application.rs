//! Application trait and lifecycle management

use crate::audio::AudioError;
use crate::engine::{Engine, EngineError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a game from the engine's frame loop. Each
/// frame runs [`Application::handle_events`], then
/// [`Application::on_frame`], then the mixer poll, then
/// [`Application::draw`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the first frame. Use this to load clips and start
    /// music.
    fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Handle input for this frame
    ///
    /// Call [`Engine::quit`] to leave the loop after the current frame.
    fn handle_events(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Update game logic
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn on_frame(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Produce the frame; channel states seen here include this frame's poll
    fn draw(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once after the last frame, before the mixer is closed.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Audio error from a mixer call
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}
