//! Channel state machine
//!
//! Music and effect channels share one shape:
//!
//! | From | attach | resume | pause(0) | pause(d>0) | rewind |
//! |---|---|---|---|---|---|
//! | detached | paused / detached | error | error | error | error |
//! | paused | paused / detached | playing | no-op | no-op | paused |
//! | playing | error | no-op | paused | fading out | error |
//! | fading out | error | error | error | error | error |
//!
//! Poll moves `playing` and `fading_out` channels whose sound has stopped
//! to their resting state (paused for music, detached for effects).
//!
//! The planners here are pure: they validate a request against the current
//! state and say what the caller must do. Side effects on the playback
//! engine are the channel owner's job.

use super::clip::ClipKind;
use super::{AudioError, Violation};
use std::fmt;
use std::time::Duration;

/// State of a music or effect channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    /// No clip attached
    #[default]
    Detached,
    /// Clip attached, not sounding
    Paused,
    /// Clip sounding
    Playing,
    /// Clip sounding with a fade-out in flight
    FadingOut,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Detached => "detached",
            Self::Paused => "paused",
            Self::Playing => "playing",
            Self::FadingOut => "fading out",
        };
        f.write_str(text)
    }
}

/// What a valid resume request requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResumeStep {
    /// Start the sound and enter `playing`
    Start,
    /// Already playing, nothing to do
    Nothing,
}

/// What a valid pause request requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PauseStep {
    /// Halt immediately and enter `paused`
    Halt,
    /// Start a fade-out and enter `fading_out`
    FadeOut(Duration),
    /// Already paused, nothing to do
    Nothing,
}

impl ChannelState {
    /// Check whether no clip is attached
    pub fn is_detached(self) -> bool {
        self == Self::Detached
    }

    /// Check whether the channel is expected to be audible
    pub fn is_sounding(self) -> bool {
        matches!(self, Self::Playing | Self::FadingOut)
    }

    fn detached_violation(kind: ClipKind) -> Violation {
        match kind {
            ClipKind::Music => Violation::NoClipAttached,
            ClipKind::Effect => Violation::Detached,
        }
    }

    /// State after attaching a clip, or the reason attaching is refused
    pub(crate) fn plan_attach(
        self,
        operation: &'static str,
        clip_present: bool,
    ) -> Result<Self, AudioError> {
        match self {
            Self::Detached | Self::Paused => Ok(if clip_present {
                Self::Paused
            } else {
                Self::Detached
            }),
            Self::Playing => Err(AudioError::client(operation, Violation::StillPlaying)),
            Self::FadingOut => Err(AudioError::client(operation, Violation::FadingOut)),
        }
    }

    pub(crate) fn plan_resume(
        self,
        kind: ClipKind,
        operation: &'static str,
    ) -> Result<ResumeStep, AudioError> {
        match self {
            Self::Paused => Ok(ResumeStep::Start),
            Self::Playing => Ok(ResumeStep::Nothing),
            Self::Detached => Err(AudioError::client(operation, Self::detached_violation(kind))),
            Self::FadingOut => Err(AudioError::client(operation, Violation::FadingOut)),
        }
    }

    pub(crate) fn plan_pause(
        self,
        kind: ClipKind,
        operation: &'static str,
        fade_out: Duration,
    ) -> Result<PauseStep, AudioError> {
        match self {
            Self::Playing if fade_out.is_zero() => Ok(PauseStep::Halt),
            Self::Playing => Ok(PauseStep::FadeOut(fade_out)),
            Self::Paused => Ok(PauseStep::Nothing),
            Self::Detached => Err(AudioError::client(operation, Self::detached_violation(kind))),
            Self::FadingOut => Err(AudioError::client(operation, Violation::FadingOut)),
        }
    }

    /// Stopping releases a paused or playing effect channel
    pub(crate) fn plan_stop(self, operation: &'static str) -> Result<(), AudioError> {
        match self {
            Self::Paused | Self::Playing => Ok(()),
            Self::Detached => Err(AudioError::client(operation, Violation::Detached)),
            Self::FadingOut => Err(AudioError::client(operation, Violation::FadingOut)),
        }
    }

    pub(crate) fn plan_rewind(self, operation: &'static str) -> Result<(), AudioError> {
        match self {
            Self::Paused => Ok(()),
            Self::Detached | Self::Playing | Self::FadingOut => {
                Err(AudioError::client(operation, Violation::MustBePaused))
            }
        }
    }

    /// Whether poll must move this channel to its resting state
    pub(crate) fn settles_on_poll(self, still_sounding: bool) -> bool {
        self.is_sounding() && !still_sounding
    }
}
