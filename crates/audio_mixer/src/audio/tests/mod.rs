//! Mixer tests over the headless backend
//!
//! The probe plays the part of the playback engine: tests decide when a
//! sound stops being audible, then call `poll` to let the mixer notice.

mod music;

use crate::audio::backend::headless::{test_wav, HeadlessBackend, HeadlessProbe};
use crate::audio::{AudioBackend, ClipData, ClipKind, Mixer, MusicTrack, SoundEffect};
use crate::config::MixerConfig;
use std::time::Duration;

/// Mixer with `channels` effect channels over a fresh headless backend
pub(super) fn headless_mixer(channels: usize) -> (Mixer, HeadlessProbe) {
    let (backend, probe) = HeadlessBackend::with_probe();
    let mixer = Mixer::with_backend(Box::new(backend), &MixerConfig::headless(channels)).unwrap();
    (mixer, probe)
}

fn clip(kind: ClipKind, name: &str, length: Duration) -> ClipData {
    HeadlessBackend::new()
        .decode(kind, name, test_wav(length))
        .unwrap()
}

pub(super) fn track(length: Duration) -> MusicTrack {
    MusicTrack::from_data(clip(ClipKind::Music, "theme.wav", length))
}

pub(super) fn effect(length: Duration) -> SoundEffect {
    SoundEffect::from_data(clip(ClipKind::Effect, "blip.wav", length))
}
