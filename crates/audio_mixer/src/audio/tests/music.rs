//! Music channel behaviour through the mixer

use super::{headless_mixer, track};
use crate::audio::{ChannelState, MusicTrack, Violation};
use approx::assert_relative_eq;
use std::thread;
use std::time::Duration;

#[test]
fn test_natural_completion_pauses_at_zero() {
    let (mut mixer, probe) = headless_mixer(2);

    mixer.attach_music(track(Duration::from_secs(3))).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);

    mixer.resume_music(Duration::ZERO, false).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::Playing);

    probe.finish_music();
    // not observed until poll
    assert_eq!(mixer.get_music_state(), ChannelState::Playing);

    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);
    assert_eq!(mixer.get_music_position(), Duration::ZERO);

    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);
}

#[test]
fn test_track_runs_out_in_virtual_time() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_millis(500)), false).unwrap();

    probe.advance(Duration::from_millis(400));
    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Playing);

    probe.advance(Duration::from_millis(100));
    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);
}

#[test]
fn test_looping_track_never_completes() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_millis(50)), true).unwrap();

    probe.advance(Duration::from_secs(10));
    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Playing);
    assert!(probe.last_music_start().unwrap().looping);
}

#[test]
fn test_resume_continues_from_saved_position() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_secs(60)), false).unwrap();

    thread::sleep(Duration::from_millis(20));
    mixer.pause_music(Duration::ZERO).unwrap();
    let saved = mixer.get_music_position();
    assert!(saved >= Duration::from_millis(20));

    thread::sleep(Duration::from_millis(20));
    assert_eq!(mixer.get_music_position(), saved);

    mixer.resume_music(Duration::ZERO, false).unwrap();
    assert_eq!(probe.last_music_start().unwrap().offset, saved);
    assert_eq!(probe.music_start_count(), 2);
}

#[test]
fn test_rewind_restarts_from_zero() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_secs(60)), false).unwrap();
    thread::sleep(Duration::from_millis(5));

    let err = mixer.rewind_music().unwrap_err();
    assert_eq!(err.violation(), Some(Violation::MustBePaused));

    mixer.pause_music(Duration::ZERO).unwrap();
    mixer.rewind_music().unwrap();
    assert_eq!(mixer.get_music_position(), Duration::ZERO);

    mixer.resume_music(Duration::ZERO, false).unwrap();
    assert_eq!(probe.last_music_start().unwrap().offset, Duration::ZERO);
}

#[test]
fn test_fade_in_ramps_to_music_volume() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.set_music_volume(0.5);
    mixer.attach_music(track(Duration::from_secs(5))).unwrap();
    mixer.resume_music(Duration::from_millis(200), false).unwrap();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.0);

    probe.advance(Duration::from_millis(100));
    mixer.poll();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.25);

    probe.advance(Duration::from_millis(100));
    mixer.poll();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.5);
}

#[test]
fn test_fade_out_during_fade_in_starts_from_current_gain() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.attach_music(track(Duration::from_secs(5))).unwrap();
    mixer.resume_music(Duration::from_millis(400), false).unwrap();

    probe.advance(Duration::from_millis(100));
    mixer.poll();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.25);

    mixer.pause_music(Duration::from_millis(200)).unwrap();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.25);

    probe.advance(Duration::from_millis(100));
    mixer.poll();
    assert_relative_eq!(probe.music_gain().unwrap(), 0.125);
}

#[test]
fn test_fade_out_rejects_conflicting_commands() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_secs(5)), false).unwrap();
    mixer.pause_music(Duration::from_millis(300)).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::FadingOut);

    let violations = [
        mixer.attach_music(track(Duration::from_secs(1))).unwrap_err(),
        mixer.resume_music(Duration::ZERO, false).unwrap_err(),
        mixer.pause_music(Duration::ZERO).unwrap_err(),
    ];
    for err in violations {
        assert_eq!(err.violation(), Some(Violation::FadingOut));
    }
    assert_eq!(
        mixer.rewind_music().unwrap_err().violation(),
        Some(Violation::MustBePaused)
    );

    probe.advance(Duration::from_millis(150));
    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::FadingOut);

    probe.advance(Duration::from_millis(150));
    mixer.poll();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);
    assert_eq!(mixer.get_music_position(), Duration::ZERO);
}

#[test]
fn test_idempotent_pause_and_resume() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.attach_music(track(Duration::from_secs(5))).unwrap();

    mixer.pause_music(Duration::from_millis(100)).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);

    mixer.resume_music(Duration::ZERO, false).unwrap();
    mixer.resume_music(Duration::from_secs(1), true).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::Playing);
    assert_eq!(probe.music_start_count(), 1);
}

#[test]
fn test_detached_music_refuses_commands() {
    let (mut mixer, _) = headless_mixer(1);
    assert_eq!(mixer.get_music_state(), ChannelState::Detached);

    let err = mixer.resume_music(Duration::ZERO, false).unwrap_err();
    assert_eq!(err.violation(), Some(Violation::NoClipAttached));
    assert!(err.is_client_logic());

    let err = mixer.pause_music(Duration::ZERO).unwrap_err();
    assert_eq!(err.violation(), Some(Violation::NoClipAttached));
}

#[test]
fn test_attach_replaces_and_detaches() {
    let (mut mixer, _) = headless_mixer(1);
    let theme = track(Duration::from_secs(5));

    mixer.attach_music(theme.clone()).unwrap();
    assert!(mixer.get_music().shares_data_with(&theme));

    mixer.attach_music(MusicTrack::default()).unwrap();
    assert_eq!(mixer.get_music_state(), ChannelState::Detached);
    assert!(mixer.get_music().is_empty());
}

#[test]
fn test_music_volume_reaches_backend() {
    let (mut mixer, probe) = headless_mixer(1);
    mixer.play_music(track(Duration::from_secs(5)), false).unwrap();

    mixer.set_music_volume(0.25);
    assert_relative_eq!(probe.music_gain().unwrap(), 0.25);
    mixer.set_music_volume(f32::NAN);
    assert_relative_eq!(mixer.get_music_volume(), 0.0);
}

#[test]
fn test_close_disables_mixer() {
    let (mut mixer, probe) = headless_mixer(2);
    mixer.play_music(track(Duration::from_secs(5)), true).unwrap();

    mixer.close();
    assert!(!mixer.is_enabled());
    assert!(!probe.is_music_sounding());
    assert_eq!(mixer.get_music_state(), ChannelState::Paused);
    assert!(mixer.resume_music(Duration::ZERO, false).is_err());
}
