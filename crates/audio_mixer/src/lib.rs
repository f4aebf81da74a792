//! # Audio Mixer
//!
//! Channel-based music and sound effect playback for small games.
//!
//! ## Features
//!
//! - **One music channel** with pause, fade, rewind and resume-from-position
//! - **A fixed pool of effect channels** with first-fit allocation and
//!   shared handles that go inert when their sound ends
//! - **Poll-driven completion**: sounds and fades that finish on their own
//!   are observed once per frame, never mid-frame
//! - **Disabled mode**: without an audio device the mixer still constructs
//!   and reports `is_enabled() == false`
//! - **Backends**: real output through rodio, or a silent virtual-clock
//!   engine for servers and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audio_mixer::prelude::*;
//!
//! struct MyGame {
//!     boom: SoundEffect,
//! }
//!
//! impl Application for MyGame {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let theme = MusicTrack::load("theme.ogg", &engine.mixer)?;
//!         self.boom = SoundEffect::try_load("boom.wav", &engine.mixer)?;
//!         engine.mixer.play_music(theme, true)?;
//!         Ok(())
//!     }
//!
//!     fn on_frame(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         engine.mixer.try_play_effect(self.boom.clone(), 0.7);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     audio_mixer::foundation::logging::init();
//!     let mut game = MyGame { boom: SoundEffect::default() };
//!     Engine::run(EngineConfig::default(), &mut game)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod audio;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application, Engine, EngineConfig, EngineError,
        audio::{
            AudioError, ChannelState, Mixer, MusicTrack, SoundEffect, SoundEffectHandle,
        },
        config::{Config, MixerConfig},
        foundation::time::{PositionTimer, Timer},
    };
}
