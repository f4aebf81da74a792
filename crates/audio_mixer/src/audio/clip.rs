//! Audio clip types
//!
//! A clip is an immutable, shared unit of loaded audio. Copies of a clip
//! share the same underlying data, which is released when the last copy is
//! dropped. A clip may also be empty, which is what `try_load` produces
//! for files it could not decode.

use super::mixer::Mixer;
use super::AudioError;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Which channel a clip is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipKind {
    /// Streamed background music for the music channel
    Music,
    /// Short sound for an effect channel
    Effect,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV uncompressed
    Wav,
    /// OGG Vorbis compressed
    Ogg,
    /// MP3 compressed
    Mp3,
    /// FLAC lossless
    Flac,
    /// Unknown format
    Unknown,
}

impl AudioFormat {
    /// Detect audio format from magic bytes
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => Self::Wav,
            b"OggS" => Self::Ogg,
            b"fLaC" => Self::Flac,
            // MP3 can start with ID3 tag or frame sync
            [0xFF, 0xFB, _, _] | [0xFF, 0xFA, _, _] | [0xFF, 0xF3, _, _] => Self::Mp3,
            [b'I', b'D', b'3', _] => Self::Mp3,
            _ => Self::Unknown,
        }
    }
}

/// Decoded clip contents as accepted by a playback backend
pub struct ClipData {
    name: String,
    kind: ClipKind,
    format: AudioFormat,
    bytes: Arc<[u8]>,
    duration: Option<Duration>,
}

impl ClipData {
    /// Create clip data; backends call this after validating `bytes`
    pub fn new(
        name: impl Into<String>,
        kind: ClipKind,
        format: AudioFormat,
        bytes: Arc<[u8]>,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            format,
            bytes,
            duration,
        }
    }

    /// Name the clip was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clip kind
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Encoded file bytes, shared with playback
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Total play time, when the decoder could tell
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

impl fmt::Debug for ClipData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipData")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .field("duration", &self.duration)
            .finish()
    }
}

/// Shared reference to loaded audio, or an empty clip
#[derive(Debug, Clone)]
pub struct AudioClip {
    kind: ClipKind,
    data: Option<Rc<ClipData>>,
}

impl AudioClip {
    /// An empty clip of the given kind
    pub fn empty(kind: ClipKind) -> Self {
        Self { kind, data: None }
    }

    /// Wrap loaded data
    pub fn from_data(data: ClipData) -> Self {
        Self {
            kind: data.kind,
            data: Some(Rc::new(data)),
        }
    }

    /// Check whether the clip holds no audio
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Clip kind
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Loaded data, if any
    pub fn data(&self) -> Option<&ClipData> {
        self.data.as_deref()
    }

    /// Name the clip was loaded under
    pub fn name(&self) -> Option<&str> {
        self.data().map(ClipData::name)
    }

    /// Container format
    pub fn format(&self) -> Option<AudioFormat> {
        self.data().map(ClipData::format)
    }

    /// Total play time, when known
    pub fn duration(&self) -> Option<Duration> {
        self.data().and_then(ClipData::duration)
    }

    /// Drop this copy's reference, leaving the clip empty
    pub fn clear(&mut self) {
        self.data = None;
    }

    /// Check whether two clips share the same loaded data
    pub fn shares_data_with(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Number of live copies sharing this clip's data
    pub fn share_count(&self) -> usize {
        self.data.as_ref().map_or(0, Rc::strong_count)
    }
}

/// A clip meant for the music channel
#[derive(Debug, Clone)]
pub struct MusicTrack(AudioClip);

impl Default for MusicTrack {
    fn default() -> Self {
        Self(AudioClip::empty(ClipKind::Music))
    }
}

impl MusicTrack {
    /// Load a music file, failing if it cannot be opened or decoded
    pub fn load(name: &str, mixer: &Mixer) -> Result<Self, AudioError> {
        mixer.load_clip(name, ClipKind::Music).map(Self)
    }

    /// Load a music file; an undecodable file yields an empty track
    ///
    /// # Errors
    /// Still fails if the file cannot be opened at all.
    pub fn try_load(name: &str, mixer: &Mixer) -> Result<Self, AudioError> {
        mixer.try_load_clip(name, ClipKind::Music).map(Self)
    }

    /// Wrap loaded data
    pub fn from_data(data: ClipData) -> Self {
        debug_assert_eq!(data.kind(), ClipKind::Music);
        Self(AudioClip::from_data(data))
    }
}

impl Deref for MusicTrack {
    type Target = AudioClip;

    fn deref(&self) -> &AudioClip {
        &self.0
    }
}

impl DerefMut for MusicTrack {
    fn deref_mut(&mut self) -> &mut AudioClip {
        &mut self.0
    }
}

/// A clip meant for an effect channel
#[derive(Debug, Clone)]
pub struct SoundEffect(AudioClip);

impl Default for SoundEffect {
    fn default() -> Self {
        Self(AudioClip::empty(ClipKind::Effect))
    }
}

impl SoundEffect {
    /// Load an effect file, failing if it cannot be opened or decoded
    pub fn load(name: &str, mixer: &Mixer) -> Result<Self, AudioError> {
        mixer.load_clip(name, ClipKind::Effect).map(Self)
    }

    /// Load an effect file; an undecodable file yields an empty effect
    ///
    /// # Errors
    /// Still fails if the file cannot be opened at all.
    pub fn try_load(name: &str, mixer: &Mixer) -> Result<Self, AudioError> {
        mixer.try_load_clip(name, ClipKind::Effect).map(Self)
    }

    /// Wrap loaded data
    pub fn from_data(data: ClipData) -> Self {
        debug_assert_eq!(data.kind(), ClipKind::Effect);
        Self(AudioClip::from_data(data))
    }
}

impl Deref for SoundEffect {
    type Target = AudioClip;

    fn deref(&self) -> &AudioClip {
        &self.0
    }
}

impl DerefMut for SoundEffect {
    fn deref_mut(&mut self) -> &mut AudioClip {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(kind: ClipKind) -> ClipData {
        ClipData::new("test.wav", kind, AudioFormat::Wav, Arc::from(&b"RIFF"[..]), None)
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioFormat::detect(b"RIFF....WAVE"), AudioFormat::Wav);
        assert_eq!(AudioFormat::detect(b"OggS...."), AudioFormat::Ogg);
        assert_eq!(AudioFormat::detect(b"fLaC...."), AudioFormat::Flac);
        assert_eq!(AudioFormat::detect(b"ID3\x03"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::detect(b"ABCD"), AudioFormat::Unknown);
        assert_eq!(AudioFormat::detect(b"RI"), AudioFormat::Unknown);
    }

    #[test]
    fn test_default_clips_are_empty() {
        assert!(MusicTrack::default().is_empty());
        assert!(SoundEffect::default().is_empty());
        assert_eq!(SoundEffect::default().kind(), ClipKind::Effect);
    }

    #[test]
    fn test_copies_share_data() {
        let first = SoundEffect::from_data(data(ClipKind::Effect));
        let second = first.clone();
        assert!(first.shares_data_with(&second));
        assert_eq!(first.share_count(), 2);
        drop(second);
        assert_eq!(first.share_count(), 1);
    }

    #[test]
    fn test_clear_only_affects_one_copy() {
        let mut first = MusicTrack::from_data(data(ClipKind::Music));
        let second = first.clone();
        first.clear();
        assert!(first.is_empty());
        assert!(!second.is_empty());
        assert_eq!(second.name(), Some("test.wav"));
        assert_eq!(second.share_count(), 1);
    }
}
