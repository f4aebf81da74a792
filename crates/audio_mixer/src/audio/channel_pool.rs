//! Effect channel pool
//!
//! A fixed set of effect channels with first-fit allocation. Each busy
//! channel holds one shared [`EffectInstance`]; handles keep a reference to
//! the same instance, so releasing a channel is visible to every handle that
//! still points at it.

use super::backend::AudioBackend;
use super::channel::{ChannelState, PauseStep, ResumeStep};
use super::clip::{ClipKind, SoundEffect};
use super::{unit_volume, AudioError, Violation};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// One playback of an effect on one channel
///
/// State and volume are written only by the pool. Handles read them.
#[derive(Debug)]
pub(crate) struct EffectInstance {
    channel: usize,
    effect: SoundEffect,
    state: Cell<ChannelState>,
    volume: Cell<f32>,
}

impl EffectInstance {
    pub(crate) fn channel(&self) -> usize {
        self.channel
    }

    pub(crate) fn effect(&self) -> &SoundEffect {
        &self.effect
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state.get()
    }

    pub(crate) fn volume(&self) -> f32 {
        self.volume.get()
    }
}

/// A slot in the pool
#[derive(Debug, Default)]
pub struct EffectChannel {
    instance: Option<Rc<EffectInstance>>,
}

impl EffectChannel {
    /// Current state; `detached` exactly when nothing is attached
    pub fn state(&self) -> ChannelState {
        self.instance
            .as_ref()
            .map_or(ChannelState::Detached, |instance| instance.state())
    }

    /// Effect attached to this channel, if any
    pub fn effect(&self) -> Option<&SoundEffect> {
        self.instance.as_deref().map(EffectInstance::effect)
    }

    fn set_state(&self, state: ChannelState) {
        if let Some(instance) = &self.instance {
            instance.state.set(state);
        }
    }
}

/// Fixed-size pool of effect channels
#[derive(Debug)]
pub struct ChannelPool {
    channels: Vec<EffectChannel>,
    available: usize,
}

impl ChannelPool {
    /// Create a pool with `size` detached channels
    pub fn with_capacity(size: usize) -> Self {
        Self {
            channels: (0..size).map(|_| EffectChannel::default()).collect(),
            available: size,
        }
    }

    /// Total number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check whether the pool has no channels at all
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of detached channels
    pub fn available(&self) -> usize {
        self.available
    }

    /// State of the channel at `index`
    pub fn state(&self, index: usize) -> Option<ChannelState> {
        self.channels.get(index).map(EffectChannel::state)
    }

    /// Iterate over all channels in index order
    pub fn channels(&self) -> impl Iterator<Item = &EffectChannel> {
        self.channels.iter()
    }

    /// First detached channel, if any
    pub fn allocate(&self) -> Option<usize> {
        self.channels.iter().position(|channel| channel.state().is_detached())
    }

    /// Start `effect` on the first free channel
    pub(crate) fn play(
        &mut self,
        backend: &mut dyn AudioBackend,
        effect: SoundEffect,
        volume: f32,
    ) -> Result<Rc<EffectInstance>, AudioError> {
        const OP: &str = "Mixer::play_effect";

        let clip = effect
            .data()
            .ok_or_else(|| AudioError::client(OP, Violation::NoClipAttached))?;
        let Some(index) = self.allocate() else {
            log::debug!("No free effect channel for {}", clip.name());
            return Err(AudioError::OutOfChannels);
        };

        let volume = unit_volume(volume);
        backend.start_channel(index, clip, volume)?;

        let instance = Rc::new(EffectInstance {
            channel: index,
            effect,
            state: Cell::new(ChannelState::Playing),
            volume: Cell::new(volume),
        });
        self.channels[index].instance = Some(Rc::clone(&instance));
        self.available -= 1;
        Ok(instance)
    }

    /// Detach the channel at `index`, invalidating its handles
    pub(crate) fn release(&mut self, backend: &mut dyn AudioBackend, index: usize) {
        let Some(channel) = self.channels.get_mut(index) else {
            return;
        };
        let Some(instance) = channel.instance.take() else {
            return;
        };
        instance.state.set(ChannelState::Detached);
        backend.halt_channel(index);
        self.available += 1;
    }

    /// Detach every channel
    pub(crate) fn release_all(&mut self, backend: &mut dyn AudioBackend) {
        for index in 0..self.channels.len() {
            self.release(backend, index);
        }
    }

    /// Channel index of a live instance belonging to this pool
    fn locate(&self, operation: &'static str, instance: &Rc<EffectInstance>) -> Result<usize, AudioError> {
        let index = instance.channel();
        let owned = self
            .channels
            .get(index)
            .and_then(|channel| channel.instance.as_ref())
            .is_some_and(|current| Rc::ptr_eq(current, instance));

        if owned {
            Ok(index)
        } else if instance.state().is_detached() {
            Err(AudioError::client(operation, Violation::Detached))
        } else {
            Err(AudioError::client(operation, Violation::ForeignHandle))
        }
    }

    pub(crate) fn pause(
        &mut self,
        backend: &mut dyn AudioBackend,
        instance: &Rc<EffectInstance>,
        fade_out: Duration,
    ) -> Result<(), AudioError> {
        const OP: &str = "SoundEffectHandle::pause";
        let index = self.locate(OP, instance)?;
        self.pause_channel(backend, index, OP, fade_out)
    }

    fn pause_channel(
        &mut self,
        backend: &mut dyn AudioBackend,
        index: usize,
        operation: &'static str,
        fade_out: Duration,
    ) -> Result<(), AudioError> {
        let channel = &self.channels[index];
        match channel.state().plan_pause(ClipKind::Effect, operation, fade_out)? {
            PauseStep::Nothing => {}
            PauseStep::Halt => {
                backend.pause_channel(index);
                channel.set_state(ChannelState::Paused);
            }
            PauseStep::FadeOut(duration) => {
                backend.fade_out_channel(index, duration);
                channel.set_state(ChannelState::FadingOut);
            }
        }
        Ok(())
    }

    pub(crate) fn resume(
        &mut self,
        backend: &mut dyn AudioBackend,
        instance: &Rc<EffectInstance>,
        fade_in: Duration,
    ) -> Result<(), AudioError> {
        const OP: &str = "SoundEffectHandle::resume";
        let index = self.locate(OP, instance)?;
        self.resume_channel(backend, index, OP, fade_in)
    }

    fn resume_channel(
        &mut self,
        backend: &mut dyn AudioBackend,
        index: usize,
        operation: &'static str,
        fade_in: Duration,
    ) -> Result<(), AudioError> {
        let channel = &self.channels[index];
        if channel.state().plan_resume(ClipKind::Effect, operation)? == ResumeStep::Start {
            backend.resume_channel(index, fade_in);
            channel.set_state(ChannelState::Playing);
        }
        Ok(())
    }

    pub(crate) fn stop(
        &mut self,
        backend: &mut dyn AudioBackend,
        instance: &Rc<EffectInstance>,
    ) -> Result<(), AudioError> {
        const OP: &str = "SoundEffectHandle::stop";
        let index = self.locate(OP, instance)?;
        self.channels[index].state().plan_stop(OP)?;
        self.release(backend, index);
        Ok(())
    }

    pub(crate) fn set_volume(
        &mut self,
        backend: &mut dyn AudioBackend,
        instance: &Rc<EffectInstance>,
        volume: f32,
    ) -> Result<(), AudioError> {
        const OP: &str = "SoundEffectHandle::set_volume";
        let index = self.locate(OP, instance)?;
        let volume = unit_volume(volume);
        backend.set_channel_volume(index, volume);
        instance.volume.set(volume);
        Ok(())
    }

    /// Pause every playing channel; others are skipped
    pub(crate) fn pause_all(&mut self, backend: &mut dyn AudioBackend) {
        for index in 0..self.channels.len() {
            if self.channels[index].state() == ChannelState::Playing {
                let paused = self.pause_channel(backend, index, "Mixer::pause_all_effects", Duration::ZERO);
                debug_assert!(paused.is_ok(), "playing channel {index} refused to pause");
            }
        }
    }

    /// Resume every paused channel; others are skipped
    pub(crate) fn resume_all(&mut self, backend: &mut dyn AudioBackend) {
        for index in 0..self.channels.len() {
            if self.channels[index].state() == ChannelState::Paused {
                let resumed = self.resume_channel(backend, index, "Mixer::resume_all_effects", Duration::ZERO);
                debug_assert!(resumed.is_ok(), "paused channel {index} refused to resume");
            }
        }
    }

    /// Release channels the backend no longer hears; returns how many
    pub(crate) fn poll(&mut self, backend: &mut dyn AudioBackend) -> usize {
        let mut released = 0;
        for index in 0..self.channels.len() {
            let state = self.channels[index].state();
            if state.settles_on_poll(backend.is_channel_sounding(index)) {
                log::debug!("Effect channel {} finished while {}", index, state);
                self.release(backend, index);
                released += 1;
            }
        }
        released
    }

    #[cfg(test)]
    fn detached_count(&self) -> usize {
        self.channels.iter().filter(|c| c.state().is_detached()).count()
    }
}
