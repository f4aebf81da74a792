//! Music channel
//!
//! The single streamed channel. Besides the shared state machine it keeps a
//! [`PositionTimer`] so that a paused track continues where it stopped.
//! Natural completion and finished fade-outs both collapse into `paused`
//! with the position reset to zero.

use super::backend::{AudioBackend, MusicStart};
use super::channel::{ChannelState, PauseStep, ResumeStep};
use super::clip::{ClipKind, MusicTrack};
use super::{unit_volume, AudioError, Violation};
use crate::foundation::time::PositionTimer;
use std::time::Duration;

const ATTACH: &str = "Mixer::attach_music";
const RESUME: &str = "Mixer::resume_music";
const PAUSE: &str = "Mixer::pause_music";
const REWIND: &str = "Mixer::rewind_music";

/// The music channel and its playback position
#[derive(Debug)]
pub struct MusicChannel {
    track: MusicTrack,
    state: ChannelState,
    position: PositionTimer,
    looping: bool,
    volume: f32,
}

impl Default for MusicChannel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MusicChannel {
    /// Create a detached channel at the given volume
    pub fn new(volume: f32) -> Self {
        Self {
            track: MusicTrack::default(),
            state: ChannelState::Detached,
            position: PositionTimer::new_paused(),
            looping: false,
            volume: unit_volume(volume),
        }
    }

    /// Current state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Attached track; empty when detached
    pub fn track(&self) -> &MusicTrack {
        &self.track
    }

    /// Playback position within the attached track
    pub fn position(&self) -> Duration {
        self.position.elapsed()
    }

    /// Whether the last resume asked for looping
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Channel volume (0.0 to 1.0)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub(crate) fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = unit_volume(volume);
        self.volume
    }

    /// Replace the attached track; an empty track detaches the channel
    pub(crate) fn attach(&mut self, track: MusicTrack) -> Result<(), AudioError> {
        self.state = self.state.plan_attach(ATTACH, !track.is_empty())?;
        self.track = track;
        self.position = PositionTimer::new_paused();
        Ok(())
    }

    pub(crate) fn resume(
        &mut self,
        backend: &mut dyn AudioBackend,
        fade_in: Duration,
        looping: bool,
    ) -> Result<(), AudioError> {
        if self.state.plan_resume(ClipKind::Music, RESUME)? == ResumeStep::Nothing {
            return Ok(());
        }

        let clip = self
            .track
            .data()
            .ok_or_else(|| AudioError::client(RESUME, Violation::NoClipAttached))?;
        let start = MusicStart {
            offset: self.start_offset(looping),
            fade_in,
            looping,
        };
        backend.set_music_volume(self.volume);
        backend.start_music(clip, start)?;

        self.looping = looping;
        self.position.resume();
        self.state = ChannelState::Playing;
        Ok(())
    }

    pub(crate) fn pause(&mut self, backend: &mut dyn AudioBackend, fade_out: Duration) -> Result<(), AudioError> {
        match self.state.plan_pause(ClipKind::Music, PAUSE, fade_out)? {
            PauseStep::Nothing => {}
            PauseStep::Halt => {
                backend.halt_music();
                self.position.pause();
                self.state = ChannelState::Paused;
            }
            PauseStep::FadeOut(duration) => {
                // The position keeps running until poll sees the fade finish.
                backend.fade_out_music(duration);
                self.state = ChannelState::FadingOut;
            }
        }
        Ok(())
    }

    /// Where a resumed stream starts; a looping track wraps into its length
    fn start_offset(&self, looping: bool) -> Duration {
        let offset = self.position.elapsed();
        match self.track.duration() {
            Some(length) if looping && !length.is_zero() => {
                let wrapped = offset.as_nanos() % length.as_nanos();
                u64::try_from(wrapped).map_or(offset, Duration::from_nanos)
            }
            _ => offset,
        }
    }

    /// Validate a pause request when no device is open
    pub(crate) fn pause_without_device(&self, fade_out: Duration) -> Result<(), AudioError> {
        self.state.plan_pause(ClipKind::Music, PAUSE, fade_out).map(|_| ())
    }

    pub(crate) fn rewind(&mut self) -> Result<(), AudioError> {
        self.state.plan_rewind(REWIND)?;
        self.position.reset();
        Ok(())
    }

    /// Settle a silent `playing` or `fading_out` channel; returns whether it moved
    pub(crate) fn poll(&mut self, backend: &dyn AudioBackend) -> bool {
        if !self.state.settles_on_poll(backend.is_music_sounding()) {
            return false;
        }
        log::debug!("Music finished: {}", self.track.name().unwrap_or("<empty>"));
        self.settle();
        true
    }

    /// Drop to `paused` at position zero, as if the track had run out
    pub(crate) fn settle(&mut self) {
        if self.state.is_sounding() {
            self.state = ChannelState::Paused;
        }
        self.position.pause();
        self.position.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::headless::{test_wav, HeadlessBackend, HeadlessProbe};
    use crate::audio::backend::BackendConfig;

    fn setup() -> (HeadlessBackend, HeadlessProbe, MusicTrack) {
        let (mut backend, probe) = HeadlessBackend::with_probe();
        backend.initialize(&BackendConfig::default()).unwrap();
        let data = backend
            .decode(ClipKind::Music, "theme.wav", test_wav(Duration::from_secs(2)))
            .unwrap();
        (backend, probe, MusicTrack::from_data(data))
    }

    #[test]
    fn test_attach_empty_track_detaches() {
        let (_, _, track) = setup();
        let mut music = MusicChannel::default();
        music.attach(track).unwrap();
        assert_eq!(music.state(), ChannelState::Paused);

        music.attach(MusicTrack::default()).unwrap();
        assert_eq!(music.state(), ChannelState::Detached);
        assert!(music.track().is_empty());
    }

    #[test]
    fn test_attach_while_playing_fails() {
        let (mut backend, _, track) = setup();
        let mut music = MusicChannel::default();
        music.attach(track.clone()).unwrap();
        music.resume(&mut backend, Duration::ZERO, false).unwrap();

        let err = music.attach(track).unwrap_err();
        assert_eq!(err.violation(), Some(Violation::StillPlaying));
        assert_eq!(music.state(), ChannelState::Playing);
    }

    #[test]
    fn test_resume_passes_position_and_loop_flag() {
        let (mut backend, probe, track) = setup();
        let mut music = MusicChannel::new(0.5);
        music.attach(track).unwrap();
        music.resume(&mut backend, Duration::from_millis(250), true).unwrap();

        let start = probe.last_music_start().unwrap();
        assert_eq!(start.offset, Duration::ZERO);
        assert_eq!(start.fade_in, Duration::from_millis(250));
        assert!(start.looping);
        assert!(music.is_looping());
    }

    #[test]
    fn test_pause_resume_is_idempotent() {
        let (mut backend, probe, track) = setup();
        let mut music = MusicChannel::default();
        music.attach(track).unwrap();

        music.pause(&mut backend, Duration::ZERO).unwrap();
        assert_eq!(music.state(), ChannelState::Paused);

        music.resume(&mut backend, Duration::ZERO, false).unwrap();
        music.resume(&mut backend, Duration::ZERO, false).unwrap();
        assert_eq!(music.state(), ChannelState::Playing);
        assert_eq!(probe.music_start_count(), 1);
    }

    #[test]
    fn test_fade_out_settles_at_poll() {
        let (mut backend, probe, track) = setup();
        let mut music = MusicChannel::default();
        music.attach(track).unwrap();
        music.resume(&mut backend, Duration::ZERO, false).unwrap();
        music.pause(&mut backend, Duration::from_millis(100)).unwrap();
        assert_eq!(music.state(), ChannelState::FadingOut);

        let err = music.resume(&mut backend, Duration::ZERO, false).unwrap_err();
        assert_eq!(err.violation(), Some(Violation::FadingOut));

        assert!(!music.poll(&backend));
        probe.advance(Duration::from_millis(100));
        backend.update();
        assert!(music.poll(&backend));
        assert_eq!(music.state(), ChannelState::Paused);
        assert_eq!(music.position(), Duration::ZERO);
        assert!(!music.poll(&backend));
    }

    #[test]
    fn test_looping_offset_wraps_into_track() {
        let (mut backend, probe, _) = setup();
        let data = backend
            .decode(ClipKind::Music, "jingle.wav", test_wav(Duration::from_millis(50)))
            .unwrap();
        let mut music = MusicChannel::default();
        music.attach(MusicTrack::from_data(data)).unwrap();
        music.resume(&mut backend, Duration::ZERO, true).unwrap();

        std::thread::sleep(Duration::from_millis(120));
        music.pause(&mut backend, Duration::ZERO).unwrap();
        assert!(music.position() >= Duration::from_millis(120));

        music.resume(&mut backend, Duration::ZERO, true).unwrap();
        let start = probe.last_music_start().unwrap();
        assert!(start.offset < Duration::from_millis(50));
        assert!(start.looping);
    }

    #[test]
    fn test_position_runs_during_fade_out() {
        let (mut backend, _, track) = setup();
        let mut music = MusicChannel::default();
        music.attach(track).unwrap();
        music.resume(&mut backend, Duration::ZERO, false).unwrap();
        music.pause(&mut backend, Duration::from_secs(1)).unwrap();

        let at_pause = music.position();
        std::thread::sleep(Duration::from_millis(10));
        assert!(music.position() > at_pause);

        music.settle();
        assert_eq!(music.position(), Duration::ZERO);
    }

    #[test]
    fn test_rewind_requires_paused() {
        let (mut backend, _, track) = setup();
        let mut music = MusicChannel::default();
        assert_eq!(music.rewind().unwrap_err().violation(), Some(Violation::MustBePaused));

        music.attach(track).unwrap();
        music.rewind().unwrap();
        music.resume(&mut backend, Duration::ZERO, false).unwrap();
        assert_eq!(music.rewind().unwrap_err().violation(), Some(Violation::MustBePaused));
    }

    #[test]
    fn test_pause_without_device() {
        let music = MusicChannel::default();
        let err = music.pause_without_device(Duration::ZERO).unwrap_err();
        assert_eq!(err.violation(), Some(Violation::NoClipAttached));
    }
}
