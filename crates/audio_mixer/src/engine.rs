//! Frame loop
//!
//! The engine owns the [`Mixer`] and a frame [`Timer`] and runs an
//! [`Application`] one frame at a time. The mixer poll sits between the
//! application's logic and its drawing, so every frame is drawn against
//! channel states that already reflect sounds which ended during it.

use crate::{
    application::{AppError, Application},
    audio::Mixer,
    config::MixerConfig,
    foundation::time::Timer,
};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Main engine struct
pub struct Engine {
    /// Audio mixer
    pub mixer: Mixer,

    /// Frame timing
    timer: Timer,

    config: EngineConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create a new engine instance, opening the audio device
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config
            .mixer
            .validate()
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        let mixer = Mixer::open(&config.mixer);
        if !mixer.is_enabled() {
            log::warn!("Audio is disabled for this run");
        }
        Ok(Self::with_mixer(config, mixer))
    }

    /// Create an engine around an already constructed mixer
    pub fn with_mixer(config: EngineConfig, mixer: Mixer) -> Self {
        Self {
            mixer,
            timer: Timer::new(),
            config,
            running: true,
        }
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        Self::new(config)?.run_app(app)
    }

    /// Run `app` on this engine until it quits
    pub fn run_app<T: Application>(mut self, app: &mut T) -> Result<(), EngineError> {
        app.initialize(&mut self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");

        let frame_budget = self.config.frame_budget();
        while self.running {
            self.run_frame(app)?;

            if let Some(rest) = frame_budget.checked_sub(self.timer.frame_elapsed()) {
                thread::sleep(rest);
            }
        }

        app.cleanup(&mut self);
        self.mixer.close();

        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps)",
            self.timer.frame_count(),
            self.timer.average_fps()
        );
        Ok(())
    }

    /// Run one frame: events, logic, mixer poll, drawing
    pub fn run_frame<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        self.timer.update();
        let delta_time = self.timer.delta_time();

        app.handle_events(self)
            .map_err(|e| EngineError::ApplicationError(format!("App events: {}", e)))?;
        app.on_frame(self, delta_time)
            .map_err(|e| EngineError::ApplicationError(format!("App update: {}", e)))?;

        self.mixer.poll();

        app.draw(self)
            .map_err(|e| EngineError::ApplicationError(format!("App draw: {}", e)))?;
        Ok(())
    }

    /// Request engine shutdown after the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Check whether the loop will run another frame
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Number of frames run so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    /// Get the mixer
    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Get mutable access to the mixer
    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Audio configuration
    pub mixer: MixerConfig,

    /// Frame rate the loop paces itself to
    pub target_fps: u32,
}

impl EngineConfig {
    fn frame_budget(&self) -> Duration {
        if self.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / self.target_fps
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mixer: MixerConfig::default(),
            target_fps: 60,
        }
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
