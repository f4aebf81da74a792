//! Audio backend implementations
//!
//! A backend is the external playback engine: it decodes clip bytes, starts,
//! pauses, resumes, fades and halts sounds, and answers one question at
//! poll time: is a given channel still sounding? It knows nothing about
//! the channel state machine.

pub mod headless;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

use crate::audio::clip::{ClipData, ClipKind};
use crate::audio::AudioError;
use crate::config::{BackendKind, MixerConfig};
use std::time::Duration;

/// How to start the music stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicStart {
    /// Position in the track to start from
    pub offset: Duration,
    /// Fade-in ramp length; zero starts at full volume
    pub fade_in: Duration,
    /// Repeat the track forever
    pub looping: bool,
}

/// Audio backend trait for platform abstraction
///
/// # Threading
/// Not `Send + Sync`: the mixer is single-threaded by contract, and every
/// call, including [`AudioBackend::update`], comes from the game's logic
/// thread.
///
/// # Channel indices
/// Effect channels are numbered `0..effect_channels`. Out-of-range indices
/// are ignored by control calls and report "not sounding".
pub trait AudioBackend {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Initialize the audio backend
    fn initialize(&mut self, config: &BackendConfig) -> Result<(), AudioError>;

    /// Shutdown the audio backend
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Validate and wrap encoded clip bytes
    ///
    /// # Errors
    /// `Decode` if the bytes are not a format this backend can play.
    fn decode(&self, kind: ClipKind, name: &str, bytes: Vec<u8>) -> Result<ClipData, AudioError>;

    /// Advance fades and retire finished sounds (called once per poll)
    fn update(&mut self);

    /// Stop every sound, music included
    fn stop_all(&mut self);

    /// Replace the music stream with `clip`, starting as described
    fn start_music(&mut self, clip: &ClipData, start: MusicStart) -> Result<(), AudioError>;

    /// Stop the music stream immediately
    fn halt_music(&mut self);

    /// Fade the music stream out and stop it when the ramp ends
    fn fade_out_music(&mut self, duration: Duration);

    /// Check whether a music stream exists and has not finished
    fn is_music_sounding(&self) -> bool;

    /// Set the music volume (0.0 to 1.0)
    fn set_music_volume(&mut self, volume: f32);

    /// Start `clip` on an effect channel, replacing anything there
    fn start_channel(&mut self, channel: usize, clip: &ClipData, volume: f32) -> Result<(), AudioError>;

    /// Pause an effect channel in place
    fn pause_channel(&mut self, channel: usize);

    /// Continue a paused effect channel, ramping its volume in over `fade_in`
    fn resume_channel(&mut self, channel: usize, fade_in: Duration);

    /// Stop an effect channel immediately
    fn halt_channel(&mut self, channel: usize);

    /// Fade an effect channel out and stop it when the ramp ends
    fn fade_out_channel(&mut self, channel: usize, duration: Duration);

    /// Check whether a channel holds a sound that has not finished.
    /// Paused sounds count as sounding.
    fn is_channel_sounding(&self, channel: usize) -> bool;

    /// Set the volume of an effect channel (0.0 to 1.0)
    fn set_channel_volume(&mut self, channel: usize, volume: f32);
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
    /// Number of effect channels to provide
    pub effect_channels: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
            effect_channels: crate::config::DEFAULT_EFFECT_CHANNELS,
        }
    }
}

impl From<&MixerConfig> for BackendConfig {
    fn from(config: &MixerConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.output_channels,
            buffer_size: config.buffer_size,
            effect_channels: config.effect_channels,
        }
    }
}

/// Create and initialize the backend selected by `kind`
pub fn create_backend(kind: BackendKind, config: &BackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    let mut backend: Box<dyn AudioBackend> = match kind {
        BackendKind::Headless => Box::new(headless::HeadlessBackend::new()),
        #[cfg(feature = "rodio")]
        BackendKind::Rodio => Box::new(rodio_backend::RodioBackend::new()),
        #[cfg(not(feature = "rodio"))]
        BackendKind::Rodio => {
            return Err(AudioError::BackendInitFailed(
                "built without the rodio feature".to_string(),
            ))
        }
    };
    backend.initialize(config)?;
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_from_mixer_config() {
        let config = BackendConfig::from(&MixerConfig::headless(3));
        assert_eq!(config.effect_channels, 3);
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn test_create_headless_backend() {
        let config = BackendConfig {
            effect_channels: 4,
            ..BackendConfig::default()
        };
        let backend = create_backend(BackendKind::Headless, &config).unwrap();
        assert!(backend.is_initialized());
        assert_eq!(backend.name(), "headless");
        assert!(!backend.is_channel_sounding(0));
    }
}
