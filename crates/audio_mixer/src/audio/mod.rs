//! Audio mixing subsystem
//!
//! One music channel plus a fixed pool of effect channels, each driven by
//! the same four-state machine (see [`ChannelState`]). Callers issue
//! commands directly; completion of sounds and fades is only discovered
//! when the frame loop calls [`Mixer::poll`].
//!
//! ```no_run
//! use std::time::Duration;
//! use audio_mixer::audio::{Mixer, MusicTrack, SoundEffect};
//! use audio_mixer::config::MixerConfig;
//!
//! let mut mixer = Mixer::open(&MixerConfig::default());
//! let theme = MusicTrack::load("theme.ogg", &mixer)?;
//! let boom = SoundEffect::load("boom.wav", &mixer)?;
//!
//! mixer.play_music(theme, true)?;
//! let handle = mixer.play_effect(boom, 0.8)?;
//! handle.pause(&mut mixer)?;
//!
//! // once per frame, between input handling and drawing:
//! mixer.poll();
//! mixer.pause_music(Duration::from_millis(500))?;
//! # Ok::<(), audio_mixer::audio::AudioError>(())
//! ```

pub mod backend;
pub mod channel;
pub mod channel_pool;
pub mod clip;
pub mod fade;
pub mod handle;
pub mod mixer;
pub mod music;
pub mod session;

#[cfg(test)]
mod tests;

pub use backend::{AudioBackend, BackendConfig, MusicStart};
pub use channel::ChannelState;
pub use clip::{AudioClip, AudioFormat, ClipData, ClipKind, MusicTrack, SoundEffect};
pub use fade::{FadeDirection, FadeRamp};
pub use handle::SoundEffectHandle;
pub use mixer::Mixer;
pub use session::AudioSession;

use crate::assets::AssetError;
use std::fmt;
use thiserror::Error;

/// Precondition a caller violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The channel is playing
    StillPlaying,
    /// The channel has a fade-out in flight
    FadingOut,
    /// The channel has no clip attached
    NoClipAttached,
    /// The operation requires a paused channel
    MustBePaused,
    /// The handle's channel has been released
    Detached,
    /// The handle never referred to a channel
    EmptyHandle,
    /// The handle belongs to a different mixer
    ForeignHandle,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::StillPlaying => "still playing",
            Self::FadingOut => "fading out",
            Self::NoClipAttached => "no clip attached",
            Self::MustBePaused => "must be paused",
            Self::Detached => "detached",
            Self::EmptyHandle => "empty handle",
            Self::ForeignHandle => "handle belongs to another mixer",
        };
        f.write_str(text)
    }
}

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// Caller violated a state-machine precondition
    #[error("{operation}: {violation}")]
    ClientLogic {
        /// Operation that was refused, e.g. `Mixer::attach_music`
        operation: &'static str,
        /// What was wrong
        violation: Violation,
    },

    /// Every effect channel is busy
    #[error("Could not play effect: out of channels")]
    OutOfChannels,

    /// The audio device is not open
    #[error("Mixer is not enabled")]
    NotEnabled,

    /// Clip file could not be opened
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Clip file opened but is not a supported audio format
    #[error("Could not load {name}: {reason}")]
    Decode {
        /// Clip name as requested
        name: String,
        /// Decoder message
        reason: String,
    },

    /// Backend initialization failed
    #[error("Backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Backend could not start a sound
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

impl AudioError {
    /// Shorthand for a client logic error
    pub fn client(operation: &'static str, violation: Violation) -> Self {
        Self::ClientLogic {
            operation,
            violation,
        }
    }

    /// The violated precondition, if this is a client logic error
    pub fn violation(&self) -> Option<Violation> {
        match self {
            Self::ClientLogic { violation, .. } => Some(*violation),
            _ => None,
        }
    }

    /// Caller could have avoided this by checking state first
    pub fn is_client_logic(&self) -> bool {
        matches!(self, Self::ClientLogic { .. })
    }

    /// Environment failure: device, file system or decoder
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            Self::NotEnabled
                | Self::Asset(_)
                | Self::Decode { .. }
                | Self::BackendInitFailed(_)
                | Self::PlaybackFailed(_)
        )
    }
}

/// Clamp a volume to the unit interval, mapping NaN to silence
pub(crate) fn unit_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_client_logic_message() {
        let err = AudioError::client("Mixer::attach_music", Violation::StillPlaying);
        assert_eq!(err.to_string(), "Mixer::attach_music: still playing");
        assert!(err.is_client_logic());
        assert!(!err.is_host_error());
        assert_eq!(err.violation(), Some(Violation::StillPlaying));
    }

    #[test]
    fn test_error_classification() {
        assert!(!AudioError::OutOfChannels.is_client_logic());
        assert!(!AudioError::OutOfChannels.is_host_error());
        assert!(AudioError::NotEnabled.is_host_error());
        assert_eq!(AudioError::OutOfChannels.to_string(), "Could not play effect: out of channels");
    }

    #[test]
    fn test_unit_volume() {
        assert_eq!(unit_volume(1.5), 1.0);
        assert_eq!(unit_volume(-0.2), 0.0);
        assert_eq!(unit_volume(f32::NAN), 0.0);
        assert_eq!(unit_volume(0.25), 0.25);
    }
}
