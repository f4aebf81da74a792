//! Headless audio backend
//!
//! Plays nothing, but models everything the mixer can observe: which
//! sounds exist, which are paused, their gain and fade ramps, and when they
//! run out. Time only moves when [`HeadlessProbe::advance`] is called, and
//! takes effect at the next [`AudioBackend::update`], which the mixer runs
//! at the start of every poll. That makes it useful both for servers and
//! CI machines without a sound card and as a scriptable oracle in tests.

use super::{AudioBackend, BackendConfig, MusicStart};
use crate::audio::clip::{AudioFormat, ClipData, ClipKind};
use crate::audio::fade::{FadeDirection, FadeRamp};
use crate::audio::{unit_volume, AudioError};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Voice {
    /// Play time left; `None` when the clip length is unknown
    remaining: Option<Duration>,
    looping: bool,
    paused: bool,
    volume: f32,
    ramp: Option<FadeRamp>,
}

impl Voice {
    fn new(length: Option<Duration>, offset: Duration, looping: bool, volume: f32) -> Self {
        Self {
            remaining: length.map(|len| len.saturating_sub(offset)),
            looping,
            paused: false,
            volume,
            ramp: None,
        }
    }

    fn ramp_gain(&self) -> f32 {
        self.ramp.map_or(1.0, |ramp| ramp.gain())
    }

    fn gain(&self) -> f32 {
        self.volume * self.ramp_gain()
    }

    /// Move forward by `dt`; returns false once the voice has finished
    fn advance(&mut self, dt: Duration) -> bool {
        if self.paused {
            return true;
        }

        if let Some(ramp) = self.ramp.as_mut() {
            ramp.advance(dt);
            if ramp.is_complete() {
                let direction = ramp.direction();
                self.ramp = None;
                if direction == FadeDirection::Out {
                    return false;
                }
            }
        }

        if self.looping {
            return true;
        }

        match self.remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(dt);
                !remaining.is_zero()
            }
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    initialized: bool,
    music: Option<Voice>,
    music_volume: f32,
    channels: Vec<Option<Voice>>,
    pending: Duration,
    last_music_start: Option<MusicStart>,
    music_starts: usize,
}

impl HeadlessState {
    fn channel_mut(&mut self, channel: usize) -> Option<&mut Voice> {
        self.channels.get_mut(channel).and_then(Option::as_mut)
    }

    fn channel(&self, channel: usize) -> Option<&Voice> {
        self.channels.get(channel).and_then(Option::as_ref)
    }
}

/// Silent backend driven by a virtual clock
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Create an uninitialized headless backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend together with a probe observing the same state
    pub fn with_probe() -> (Self, HeadlessProbe) {
        let backend = Self::new();
        let probe = backend.probe();
        (backend, probe)
    }

    /// Handle for inspecting and steering this backend from outside the mixer
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl AudioBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn initialize(&mut self, config: &BackendConfig) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if state.initialized {
            return Ok(());
        }
        state.channels = vec![None; config.effect_channels];
        state.music_volume = 1.0;
        state.initialized = true;
        log::info!("Headless audio backend initialized with {} channels", config.effect_channels);
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return;
        }
        state.music = None;
        state.channels.clear();
        state.initialized = false;
        log::info!("Headless audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    fn decode(&self, kind: ClipKind, name: &str, bytes: Vec<u8>) -> Result<ClipData, AudioError> {
        let format = AudioFormat::detect(&bytes);
        if format == AudioFormat::Unknown {
            return Err(AudioError::Decode {
                name: name.to_string(),
                reason: "unrecognized audio format".to_string(),
            });
        }

        let duration = match format {
            AudioFormat::Wav => wav_duration(&bytes),
            _ => None,
        };
        Ok(ClipData::new(name, kind, format, Arc::from(bytes), duration))
    }

    fn update(&mut self) {
        let mut state = self.state.borrow_mut();
        let dt = std::mem::take(&mut state.pending);
        if dt.is_zero() {
            return;
        }

        if let Some(music) = state.music.as_mut() {
            if !music.advance(dt) {
                state.music = None;
            }
        }
        for slot in &mut state.channels {
            if let Some(voice) = slot.as_mut() {
                if !voice.advance(dt) {
                    *slot = None;
                }
            }
        }
    }

    fn stop_all(&mut self) {
        let mut state = self.state.borrow_mut();
        state.music = None;
        for slot in &mut state.channels {
            *slot = None;
        }
    }

    fn start_music(&mut self, clip: &ClipData, start: MusicStart) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(AudioError::NotEnabled);
        }
        let mut voice = Voice::new(clip.duration(), start.offset, start.looping, state.music_volume);
        if !start.fade_in.is_zero() {
            voice.ramp = Some(FadeRamp::fade_in(start.fade_in));
        }
        state.music = Some(voice);
        state.last_music_start = Some(start);
        state.music_starts += 1;
        Ok(())
    }

    fn halt_music(&mut self) {
        self.state.borrow_mut().music = None;
    }

    fn fade_out_music(&mut self, duration: Duration) {
        if let Some(music) = self.state.borrow_mut().music.as_mut() {
            music.ramp = Some(FadeRamp::fade_out_from(music.ramp_gain(), duration));
        }
    }

    fn is_music_sounding(&self) -> bool {
        self.state.borrow().music.is_some()
    }

    fn set_music_volume(&mut self, volume: f32) {
        let mut state = self.state.borrow_mut();
        state.music_volume = unit_volume(volume);
        let music_volume = state.music_volume;
        if let Some(music) = state.music.as_mut() {
            music.volume = music_volume;
        }
    }

    fn start_channel(&mut self, channel: usize, clip: &ClipData, volume: f32) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .channels
            .get_mut(channel)
            .ok_or_else(|| AudioError::PlaybackFailed(format!("no such channel: {channel}")))?;
        *slot = Some(Voice::new(clip.duration(), Duration::ZERO, false, unit_volume(volume)));
        Ok(())
    }

    fn pause_channel(&mut self, channel: usize) {
        if let Some(voice) = self.state.borrow_mut().channel_mut(channel) {
            voice.paused = true;
        }
    }

    fn resume_channel(&mut self, channel: usize, fade_in: Duration) {
        if let Some(voice) = self.state.borrow_mut().channel_mut(channel) {
            voice.paused = false;
            voice.ramp = (!fade_in.is_zero()).then(|| FadeRamp::fade_in(fade_in));
        }
    }

    fn halt_channel(&mut self, channel: usize) {
        if let Some(slot) = self.state.borrow_mut().channels.get_mut(channel) {
            *slot = None;
        }
    }

    fn fade_out_channel(&mut self, channel: usize, duration: Duration) {
        if let Some(voice) = self.state.borrow_mut().channel_mut(channel) {
            voice.ramp = Some(FadeRamp::fade_out_from(voice.ramp_gain(), duration));
        }
    }

    fn is_channel_sounding(&self, channel: usize) -> bool {
        self.state.borrow().channel(channel).is_some()
    }

    fn set_channel_volume(&mut self, channel: usize, volume: f32) {
        if let Some(voice) = self.state.borrow_mut().channel_mut(channel) {
            voice.volume = unit_volume(volume);
        }
    }
}

/// Outside view of a [`HeadlessBackend`]
///
/// Cloning a probe is cheap; all clones observe the same backend.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessProbe {
    /// Let `dt` of virtual time pass; applied at the next backend update
    pub fn advance(&self, dt: Duration) {
        self.state.borrow_mut().pending += dt;
    }

    /// Make the music stream run out right now
    pub fn finish_music(&self) {
        self.state.borrow_mut().music = None;
    }

    /// Make an effect channel run out right now
    pub fn finish_channel(&self, channel: usize) {
        if let Some(slot) = self.state.borrow_mut().channels.get_mut(channel) {
            *slot = None;
        }
    }

    /// Check whether the backend holds a music stream
    pub fn is_music_sounding(&self) -> bool {
        self.state.borrow().music.is_some()
    }

    /// Effective music gain (volume times fade), if a stream exists
    pub fn music_gain(&self) -> Option<f32> {
        self.state.borrow().music.as_ref().map(Voice::gain)
    }

    /// How the music stream was most recently started
    pub fn last_music_start(&self) -> Option<MusicStart> {
        self.state.borrow().last_music_start
    }

    /// Number of times the music stream has been started
    pub fn music_start_count(&self) -> usize {
        self.state.borrow().music_starts
    }

    /// Check whether an effect channel holds a sound
    pub fn is_channel_sounding(&self, channel: usize) -> bool {
        self.state.borrow().channel(channel).is_some()
    }

    /// Whether an effect channel's sound is paused, if it holds one
    pub fn is_channel_paused(&self, channel: usize) -> Option<bool> {
        self.state.borrow().channel(channel).map(|voice| voice.paused)
    }

    /// Effective gain of an effect channel, if it holds a sound
    pub fn channel_gain(&self, channel: usize) -> Option<f32> {
        self.state.borrow().channel(channel).map(Voice::gain)
    }
}

/// Play time of a RIFF/WAVE file, from its `fmt ` byte rate and `data` size
fn wav_duration(bytes: &[u8]) -> Option<Duration> {
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut byte_rate = None;
    let mut data_len = None;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body = pos + 8;
        match id {
            b"fmt " if body + 12 <= bytes.len() => {
                byte_rate = Some(u32::from_le_bytes(bytes[body + 8..body + 12].try_into().ok()?));
            }
            b"data" => data_len = Some(size),
            _ => {}
        }
        // chunks are padded to even length
        pos = body + size + (size & 1);
    }

    match (byte_rate, data_len) {
        (Some(rate), Some(len)) if rate > 0 => Some(Duration::from_secs_f64(len as f64 / f64::from(rate))),
        _ => None,
    }
}

/// Build a minimal PCM WAV file of the given length (16-bit mono, silent)
#[cfg(test)]
pub(crate) fn test_wav(length: Duration) -> Vec<u8> {
    const RATE: u32 = 8000;
    let data_len = (length.as_secs_f64() * f64::from(RATE) * 2.0) as u32;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&RATE.to_le_bytes());
    wav.extend_from_slice(&(RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}
