//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback.
//! Rodio is pure Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats.
//!
//! Each channel, music included, owns one [`Sink`]. Fade ramps are applied
//! by scaling the sink volume in [`AudioBackend::update`], so their
//! resolution is one frame.
//!
//! # Example
//!
//! ```no_run
//! use audio_mixer::audio::backend::{AudioBackend, BackendConfig};
//! use audio_mixer::audio::backend::rodio_backend::RodioBackend;
//! use audio_mixer::audio::ClipKind;
//!
//! let mut backend = RodioBackend::new();
//! backend.initialize(&BackendConfig::default()).unwrap();
//!
//! let bytes = std::fs::read("Resources/explosion.wav").unwrap();
//! let clip = backend.decode(ClipKind::Effect, "explosion.wav", bytes).unwrap();
//! backend.start_channel(0, &clip, 0.5).unwrap();
//!
//! backend.update(); // advances fades, drops finished sinks
//! backend.shutdown();
//! ```

use super::{AudioBackend, BackendConfig, MusicStart};
use crate::audio::clip::{AudioFormat, ClipData, ClipKind};
use crate::audio::fade::{FadeDirection, FadeRamp};
use crate::audio::{unit_volume, AudioError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

type ClipReader = Cursor<Arc<[u8]>>;

fn open_decoder(clip: &ClipData) -> Result<Decoder<ClipReader>, AudioError> {
    Decoder::new(Cursor::new(Arc::clone(clip.bytes())))
        .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode {}: {}", clip.name(), e)))
}

/// A sink plus the volume and ramp it is mixed at
struct Voice {
    sink: Sink,
    volume: f32,
    ramp: Option<FadeRamp>,
}

impl Voice {
    fn new(sink: Sink, volume: f32, fade_in: Duration) -> Self {
        let voice = Self {
            sink,
            volume,
            ramp: (!fade_in.is_zero()).then(|| FadeRamp::fade_in(fade_in)),
        };
        voice.apply_gain();
        voice
    }

    fn ramp_gain(&self) -> f32 {
        self.ramp.map_or(1.0, |ramp| ramp.gain())
    }

    fn apply_gain(&self) {
        self.sink.set_volume(self.volume * self.ramp_gain());
    }

    /// Start a fade-out from wherever the current ramp has got to
    fn fade_out(&mut self, duration: Duration) {
        self.ramp = Some(FadeRamp::fade_out_from(self.ramp_gain(), duration));
        self.apply_gain();
    }

    /// Advance the ramp; returns false once a fade-out has run its course
    fn advance(&mut self, dt: Duration) -> bool {
        if self.sink.is_paused() {
            return true;
        }
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.advance(dt);
            if ramp.is_complete() {
                let direction = ramp.direction();
                self.ramp = None;
                if direction == FadeDirection::Out {
                    self.sink.stop();
                    return false;
                }
            }
        }
        self.apply_gain();
        !self.sink.empty()
    }

    fn is_sounding(&self) -> bool {
        !self.sink.empty()
    }
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    music: Option<Voice>,
    music_volume: f32,
    channels: Vec<Option<Voice>>,
    last_update: Instant,
    /// Initialization state
    initialized: bool,
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            music: None,
            music_volume: 1.0,
            channels: Vec::new(),
            last_update: Instant::now(),
            initialized: false,
        }
    }

    fn new_sink(&self) -> Result<Sink, AudioError> {
        let stream_handle = self.stream_handle.as_ref().ok_or(AudioError::NotEnabled)?;
        Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {}", e)))
    }

    fn channel(&self, channel: usize) -> Option<&Voice> {
        self.channels.get(channel).and_then(Option::as_ref)
    }

    fn channel_mut(&mut self, channel: usize) -> Option<&mut Voice> {
        self.channels.get_mut(channel).and_then(Option::as_mut)
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn initialize(&mut self, config: &BackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        // Create output stream
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {}", e)))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.channels = (0..config.effect_channels).map(|_| None).collect();
        self.last_update = Instant::now();
        self.initialized = true;

        log::info!(
            "Rodio audio backend initialized ({} effect channels)",
            config.effect_channels
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stop_all();
        self.channels.clear();

        // Drop stream handle and output
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;

        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn decode(&self, kind: ClipKind, name: &str, bytes: Vec<u8>) -> Result<ClipData, AudioError> {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let decoder = Decoder::new(Cursor::new(Arc::clone(&bytes))).map_err(|e| AudioError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let duration = decoder.total_duration();
        let format = AudioFormat::detect(&bytes);
        Ok(ClipData::new(name, kind, format, bytes, duration))
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update);
        self.last_update = now;

        if let Some(music) = self.music.as_mut() {
            if !music.advance(dt) {
                self.music = None;
            }
        }
        for slot in &mut self.channels {
            if let Some(voice) = slot.as_mut() {
                if !voice.advance(dt) {
                    *slot = None;
                }
            }
        }
    }

    fn stop_all(&mut self) {
        if let Some(music) = self.music.take() {
            music.sink.stop();
        }
        for voice in self.channels.iter_mut().filter_map(Option::take) {
            voice.sink.stop();
        }
    }

    fn start_music(&mut self, clip: &ClipData, start: MusicStart) -> Result<(), AudioError> {
        let sink = self.new_sink()?;
        let source = open_decoder(clip)?;
        if start.looping {
            sink.append(source.repeat_infinite().skip_duration(start.offset));
        } else {
            sink.append(source.skip_duration(start.offset));
        }

        if let Some(old) = self.music.take() {
            old.sink.stop();
        }
        self.music = Some(Voice::new(sink, self.music_volume, start.fade_in));
        log::debug!("Music started: {} at {:?}", clip.name(), start.offset);
        Ok(())
    }

    fn halt_music(&mut self) {
        if let Some(music) = self.music.take() {
            music.sink.stop();
        }
    }

    fn fade_out_music(&mut self, duration: Duration) {
        if let Some(music) = self.music.as_mut() {
            music.fade_out(duration);
        }
    }

    fn is_music_sounding(&self) -> bool {
        self.music.as_ref().is_some_and(Voice::is_sounding)
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = unit_volume(volume);
        if let Some(music) = self.music.as_mut() {
            music.volume = self.music_volume;
            music.apply_gain();
        }
    }

    fn start_channel(&mut self, channel: usize, clip: &ClipData, volume: f32) -> Result<(), AudioError> {
        if channel >= self.channels.len() {
            return Err(AudioError::PlaybackFailed(format!("no such channel: {channel}")));
        }
        let sink = self.new_sink()?;
        sink.append(open_decoder(clip)?);

        let voice = Voice::new(sink, unit_volume(volume), Duration::ZERO);
        if let Some(old) = self.channels[channel].replace(voice) {
            old.sink.stop();
        }
        Ok(())
    }

    fn pause_channel(&mut self, channel: usize) {
        if let Some(voice) = self.channel_mut(channel) {
            voice.sink.pause();
        }
    }

    fn resume_channel(&mut self, channel: usize, fade_in: Duration) {
        if let Some(voice) = self.channel_mut(channel) {
            voice.ramp = (!fade_in.is_zero()).then(|| FadeRamp::fade_in(fade_in));
            voice.apply_gain();
            voice.sink.play();
        }
    }

    fn halt_channel(&mut self, channel: usize) {
        if let Some(voice) = self.channels.get_mut(channel).and_then(Option::take) {
            voice.sink.stop();
        }
    }

    fn fade_out_channel(&mut self, channel: usize, duration: Duration) {
        if let Some(voice) = self.channel_mut(channel) {
            voice.fade_out(duration);
        }
    }

    fn is_channel_sounding(&self, channel: usize) -> bool {
        self.channel(channel).is_some_and(Voice::is_sounding)
    }

    fn set_channel_volume(&mut self, channel: usize, volume: f32) {
        if let Some(voice) = self.channel_mut(channel) {
            voice.volume = unit_volume(volume);
            voice.apply_gain();
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
