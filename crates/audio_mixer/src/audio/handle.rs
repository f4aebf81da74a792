//! Sound effect handles
//!
//! A handle refers to one playback of an effect. Copies share the same
//! instance. Once the channel is released, by [`SoundEffectHandle::stop`]
//! or because the sound finished and [`Mixer::poll`] noticed, every copy
//! reports `detached` and refuses further commands.
//!
//! Handles do not point back at their mixer. Commands take it explicitly and
//! go through the pool, which checks that the handle still refers to the
//! instance occupying its channel.

use super::channel::ChannelState;
use super::channel_pool::EffectInstance;
use super::clip::SoundEffect;
use super::mixer::Mixer;
use super::{AudioError, Violation};
use std::rc::Rc;
use std::time::Duration;

/// Shared reference to a playing (or finished) effect
#[derive(Debug, Clone, Default)]
pub struct SoundEffectHandle {
    inner: Option<Rc<EffectInstance>>,
}

impl SoundEffectHandle {
    pub(crate) fn new(instance: Rc<EffectInstance>) -> Self {
        Self {
            inner: Some(instance),
        }
    }

    /// Check whether this handle never referred to a playback
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    fn instance(&self, operation: &'static str) -> Result<&Rc<EffectInstance>, AudioError> {
        self.inner
            .as_ref()
            .ok_or_else(|| AudioError::client(operation, Violation::EmptyHandle))
    }

    /// Instance that can still take commands
    fn live(&self, operation: &'static str) -> Result<&Rc<EffectInstance>, AudioError> {
        let instance = self.instance(operation)?;
        if instance.state().is_detached() {
            return Err(AudioError::client(operation, Violation::Detached));
        }
        Ok(instance)
    }

    /// Last state the mixer recorded for this playback
    pub fn get_state(&self) -> Result<ChannelState, AudioError> {
        self.instance("SoundEffectHandle::get_state")
            .map(|instance| instance.state())
    }

    /// The effect this handle plays
    pub fn get_effect(&self) -> Result<SoundEffect, AudioError> {
        self.instance("SoundEffectHandle::get_effect")
            .map(|instance| instance.effect().clone())
    }

    /// Channel index, while the playback is live
    pub fn channel(&self) -> Option<usize> {
        self.inner
            .as_ref()
            .filter(|instance| !instance.state().is_detached())
            .map(|instance| instance.channel())
    }

    /// Playback volume; `0.0` once detached
    pub fn get_volume(&self) -> Result<f32, AudioError> {
        let instance = self.instance("SoundEffectHandle::get_volume")?;
        Ok(if instance.state().is_detached() {
            0.0
        } else {
            instance.volume()
        })
    }

    /// Set the playback volume, clamped to `[0, 1]`
    pub fn set_volume(&self, mixer: &mut Mixer, volume: f32) -> Result<(), AudioError> {
        let instance = self.live("SoundEffectHandle::set_volume")?;
        mixer.with_effects(|pool, backend| pool.set_volume(backend, instance, volume))
    }

    /// Pause immediately; a no-op if already paused
    pub fn pause(&self, mixer: &mut Mixer) -> Result<(), AudioError> {
        self.pause_with_fade(mixer, Duration::ZERO)
    }

    /// Fade out over `fade_out`; the channel is released at the poll after
    /// the fade ends. A zero duration pauses immediately.
    pub fn pause_with_fade(&self, mixer: &mut Mixer, fade_out: Duration) -> Result<(), AudioError> {
        let instance = self.live("SoundEffectHandle::pause")?;
        mixer.with_effects(|pool, backend| pool.pause(backend, instance, fade_out))
    }

    /// Continue a paused effect; a no-op if already playing
    pub fn resume(&self, mixer: &mut Mixer) -> Result<(), AudioError> {
        self.resume_with_fade(mixer, Duration::ZERO)
    }

    /// Continue a paused effect, ramping the volume in over `fade_in`
    pub fn resume_with_fade(&self, mixer: &mut Mixer, fade_in: Duration) -> Result<(), AudioError> {
        let instance = self.live("SoundEffectHandle::resume")?;
        mixer.with_effects(|pool, backend| pool.resume(backend, instance, fade_in))
    }

    /// Stop and release the channel
    pub fn stop(&self, mixer: &mut Mixer) -> Result<(), AudioError> {
        let instance = self.live("SoundEffectHandle::stop")?;
        mixer.with_effects(|pool, backend| pool.stop(backend, instance))
    }
}
