//! Audio device session
//!
//! The explicit context a [`Mixer`](super::Mixer) owns: an open playback
//! backend, or nothing when the device could not be opened or audio was
//! turned off. A closed session is how the mixer runs disabled.

use super::backend::{create_backend, AudioBackend, BackendConfig};
use super::AudioError;
use crate::config::MixerConfig;

/// An open (or closed) connection to a playback backend
pub struct AudioSession {
    backend: Option<Box<dyn AudioBackend>>,
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl AudioSession {
    /// Open the backend named by `config`
    ///
    /// Never fails: a backend that cannot be opened is logged and yields a
    /// closed session.
    pub fn open(config: &MixerConfig) -> Self {
        if !config.enabled {
            log::info!("Audio disabled by configuration");
            return Self::disabled();
        }

        match create_backend(config.backend, &BackendConfig::from(config)) {
            Ok(backend) => {
                log::info!(
                    "Audio session opened: {} backend, {} effect channels",
                    backend.name(),
                    config.effect_channels
                );
                Self {
                    backend: Some(backend),
                }
            }
            Err(e) => {
                log::warn!("Could not open audio device, running without sound: {}", e);
                Self::disabled()
            }
        }
    }

    /// Open a session over a caller-supplied backend, initializing it if needed
    pub fn with_backend(mut backend: Box<dyn AudioBackend>, config: &BackendConfig) -> Result<Self, AudioError> {
        if !backend.is_initialized() {
            backend.initialize(config)?;
        }
        log::info!(
            "Audio session opened: {} backend, {} effect channels",
            backend.name(),
            config.effect_channels
        );
        Ok(Self {
            backend: Some(backend),
        })
    }

    /// A session with no device
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Check whether a backend is open
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// The open backend
    pub fn backend(&self) -> Option<&dyn AudioBackend> {
        self.backend.as_deref()
    }

    /// The open backend, mutably
    pub fn backend_mut(&mut self) -> Option<&mut (dyn AudioBackend + 'static)> {
        self.backend.as_deref_mut()
    }

    /// Stop all sound and shut the backend down; closing twice is harmless
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.stop_all();
            backend.shutdown();
            log::info!("Audio session closed ({})", backend.name());
        }
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::headless::HeadlessBackend;

    #[test]
    fn test_disabled_by_config() {
        let config = MixerConfig {
            enabled: false,
            ..MixerConfig::headless(4)
        };
        let session = AudioSession::open(&config);
        assert!(!session.is_open());
        assert!(session.backend().is_none());
    }

    #[test]
    fn test_open_headless() {
        let session = AudioSession::open(&MixerConfig::headless(4));
        assert!(session.is_open());
        assert_eq!(session.backend().map(|b| b.name()), Some("headless"));
    }

    #[test]
    fn test_close_shuts_backend_down() {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let mut session = AudioSession::with_backend(Box::new(backend), &BackendConfig::default()).unwrap();
        assert!(session.backend().is_some_and(|b| b.is_initialized()));

        session.close();
        session.close();
        assert!(!session.is_open());
        assert!(!probe.is_music_sounding());
    }
}
