//! Audio mixer
//!
//! The facade over one [`MusicChannel`] and a [`ChannelPool`] of effect
//! channels. Every command is synchronous and takes effect immediately;
//! sounds and fades that end on their own are only noticed by
//! [`Mixer::poll`], which the frame loop calls once per frame between
//! event handling and drawing.

use super::backend::{AudioBackend, BackendConfig};
use super::channel::ChannelState;
use super::channel_pool::ChannelPool;
use super::clip::{AudioClip, ClipKind, MusicTrack, SoundEffect};
use super::handle::SoundEffectHandle;
use super::music::MusicChannel;
use super::session::AudioSession;
use super::AudioError;
use crate::assets::AssetLoader;
use crate::config::MixerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Music and effect playback with a per-frame poll
#[derive(Debug)]
pub struct Mixer {
    session: AudioSession,
    loader: AssetLoader,
    music: MusicChannel,
    effects: ChannelPool,
}

impl Mixer {
    /// Open the configured backend; falls back to a disabled mixer if the
    /// device cannot be opened
    pub fn open(config: &MixerConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Mixer configuration: {}", e);
        }
        Self::from_session(AudioSession::open(config), config)
    }

    /// Build a mixer over a caller-supplied backend
    ///
    /// # Errors
    /// `BackendInitFailed` if the backend was not yet initialized and
    /// initializing it fails.
    pub fn with_backend(backend: Box<dyn AudioBackend>, config: &MixerConfig) -> Result<Self, AudioError> {
        let session = AudioSession::with_backend(backend, &BackendConfig::from(config))?;
        Ok(Self::from_session(session, config))
    }

    /// A mixer that never opens a device
    pub fn disabled(config: &MixerConfig) -> Self {
        Self::from_session(AudioSession::disabled(), config)
    }

    fn from_session(mut session: AudioSession, config: &MixerConfig) -> Self {
        let music = MusicChannel::new(config.music_volume);
        if let Some(backend) = session.backend_mut() {
            backend.set_music_volume(music.volume());
        }
        Self {
            session,
            loader: AssetLoader::new(config.search_paths.clone()),
            music,
            effects: ChannelPool::with_capacity(config.effect_channels),
        }
    }

    /// Check whether a device is open
    pub fn is_enabled(&self) -> bool {
        self.session.is_open()
    }

    /// Add a prefix to try when opening clip files
    pub fn add_search_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.loader.add_search_path(path);
    }

    /// Clip file search prefixes, in the order they are tried
    pub fn search_paths(&self) -> &[PathBuf] {
        self.loader.search_paths()
    }

    /// Open and decode a clip file
    ///
    /// # Errors
    /// - `NotEnabled` if no device is open
    /// - `Asset` if the file cannot be opened
    /// - `Decode` if the format is not understood
    pub fn load_clip(&self, name: &str, kind: ClipKind) -> Result<AudioClip, AudioError> {
        let backend = self.session.backend().ok_or(AudioError::NotEnabled)?;
        let asset = self.loader.read(name)?;
        log::debug!("Loading {} from {}", name, asset.path.display());
        let data = backend.decode(kind, name, asset.bytes)?;
        Ok(AudioClip::from_data(data))
    }

    /// Like [`Mixer::load_clip`], but an undecodable file or a disabled
    /// mixer yields an empty clip
    ///
    /// # Errors
    /// `Asset` if the file cannot be opened.
    pub fn try_load_clip(&self, name: &str, kind: ClipKind) -> Result<AudioClip, AudioError> {
        match self.load_clip(name, kind) {
            Ok(clip) => Ok(clip),
            Err(AudioError::NotEnabled) => Ok(AudioClip::empty(kind)),
            Err(AudioError::Decode { name, reason }) => {
                log::warn!("Could not decode {}: {}", name, reason);
                Ok(AudioClip::empty(kind))
            }
            Err(e) => Err(e),
        }
    }

    // Music

    /// Attach `track` and start it immediately
    pub fn play_music(&mut self, track: MusicTrack, forever: bool) -> Result<(), AudioError> {
        self.attach_music(track)?;
        self.resume_music(Duration::ZERO, forever)
    }

    /// Attach `track` to the music channel, leaving it paused at the start.
    /// An empty track detaches the channel.
    ///
    /// # Errors
    /// Client logic error if the music is playing or fading out.
    pub fn attach_music(&mut self, track: MusicTrack) -> Result<(), AudioError> {
        self.music.attach(track)
    }

    /// Start or continue the attached track from its saved position
    ///
    /// # Errors
    /// - `NotEnabled` if no device is open
    /// - Client logic error if no track is attached or a fade-out is in flight
    pub fn resume_music(&mut self, fade_in: Duration, forever: bool) -> Result<(), AudioError> {
        let backend = self.session.backend_mut().ok_or(AudioError::NotEnabled)?;
        self.music.resume(backend, fade_in, forever)
    }

    /// Pause the music, immediately or after fading out over `fade_out`
    ///
    /// # Errors
    /// Client logic error if no track is attached or a fade-out is in flight.
    pub fn pause_music(&mut self, fade_out: Duration) -> Result<(), AudioError> {
        match self.session.backend_mut() {
            Some(backend) => self.music.pause(backend, fade_out),
            None => self.music.pause_without_device(fade_out),
        }
    }

    /// Move the paused music back to the start
    ///
    /// # Errors
    /// Client logic error unless the music is paused.
    pub fn rewind_music(&mut self) -> Result<(), AudioError> {
        self.music.rewind()
    }

    /// Attached track; empty when the channel is detached
    pub fn get_music(&self) -> &MusicTrack {
        self.music.track()
    }

    /// Music channel state
    pub fn get_music_state(&self) -> ChannelState {
        self.music.state()
    }

    /// Playback position of the attached track
    pub fn get_music_position(&self) -> Duration {
        self.music.position()
    }

    /// Music volume (0.0 to 1.0)
    pub fn get_music_volume(&self) -> f32 {
        self.music.volume()
    }

    /// Set the music volume, clamped to `[0, 1]`
    pub fn set_music_volume(&mut self, volume: f32) {
        let volume = self.music.set_volume(volume);
        if let Some(backend) = self.session.backend_mut() {
            backend.set_music_volume(volume);
        }
    }

    // Effects

    /// Play `effect` on the first free channel at `volume`
    ///
    /// # Errors
    /// - `NotEnabled` if no device is open
    /// - `OutOfChannels` if every channel is busy
    /// - Client logic error if `effect` is empty
    pub fn play_effect(&mut self, effect: SoundEffect, volume: f32) -> Result<SoundEffectHandle, AudioError> {
        self.with_effects(|pool, backend| pool.play(backend, effect, volume))
            .map(SoundEffectHandle::new)
    }

    /// Like [`Mixer::play_effect`], but returns an empty handle instead of
    /// failing
    pub fn try_play_effect(&mut self, effect: SoundEffect, volume: f32) -> SoundEffectHandle {
        match self.play_effect(effect, volume) {
            Ok(handle) => handle,
            Err(AudioError::OutOfChannels | AudioError::NotEnabled) => SoundEffectHandle::default(),
            Err(e) => {
                log::warn!("try_play_effect: {}", e);
                SoundEffectHandle::default()
            }
        }
    }

    /// Number of detached effect channels
    pub fn available_effect_channels(&self) -> usize {
        self.effects.available()
    }

    /// Total number of effect channels
    pub fn effect_channel_count(&self) -> usize {
        self.effects.len()
    }

    /// State of one effect channel
    pub fn get_effect_channel_state(&self, index: usize) -> Option<ChannelState> {
        self.effects.state(index)
    }

    /// Pause every playing effect
    pub fn pause_all_effects(&mut self) {
        if let Some(backend) = self.session.backend_mut() {
            self.effects.pause_all(backend);
        }
    }

    /// Resume every paused effect
    pub fn resume_all_effects(&mut self) {
        if let Some(backend) = self.session.backend_mut() {
            self.effects.resume_all(backend);
        }
    }

    #[cfg(test)]
    pub(crate) fn effect_pool(&self) -> &ChannelPool {
        &self.effects
    }

    pub(crate) fn with_effects<T>(
        &mut self,
        f: impl FnOnce(&mut ChannelPool, &mut dyn AudioBackend) -> Result<T, AudioError>,
    ) -> Result<T, AudioError> {
        let backend: &mut dyn AudioBackend = self.session.backend_mut().ok_or(AudioError::NotEnabled)?;
        f(&mut self.effects, backend)
    }

    // Frame hook

    /// Reconcile channel states with what the backend still plays
    ///
    /// Call exactly once per frame, after event handling and before drawing.
    pub fn poll(&mut self) {
        let Some(backend) = self.session.backend_mut() else {
            return;
        };
        backend.update();
        self.music.poll(backend);
        let released = self.effects.poll(backend);
        if released > 0 {
            log::debug!(
                "Poll released {} effect channel(s), {} free",
                released,
                self.effects.available()
            );
        }
    }

    /// Stop all sound and close the device; the mixer is disabled afterwards
    pub fn close(&mut self) {
        if let Some(backend) = self.session.backend_mut() {
            self.effects.release_all(backend);
        }
        self.music.settle();
        self.session.close();
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.close();
    }
}
