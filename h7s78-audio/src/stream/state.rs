//! Per-stream state and the transition table.

use crate::config::{AudioInit, BitsPerSample, Device, SampleRate};
use crate::error::{Error, Result};

/// Lifecycle state of one stream.
///
/// `Init` is only observable while an Init call is in progress; a failed
/// Init falls back to `Reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    Reset,
    Init,
    Stopped,
    /// Playing (output) or recording (input).
    Streaming,
    Paused,
}

/// Lifecycle operations subject to the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Init,
    Start,
    Pause,
    Resume,
    Stop,
    DeInit,
}

impl StreamState {
    pub const ALL: [StreamState; 5] = [
        StreamState::Reset,
        StreamState::Init,
        StreamState::Stopped,
        StreamState::Streaming,
        StreamState::Paused,
    ];

    /// State reached when `transition` completes, or `Busy` if it is not
    /// allowed from `self`.
    ///
    /// | From | Init | Start | Pause | Resume | Stop | DeInit |
    /// |------|------|-------|-------|--------|------|--------|
    /// | Reset | Stopped | Busy | Busy | Busy | Busy | Reset |
    /// | Init | Busy | Busy | Busy | Busy | Busy | Reset |
    /// | Stopped | Busy | Streaming | Busy | Busy | Stopped | Reset |
    /// | Streaming | Busy | Busy | Paused | Busy | Stopped | Reset |
    /// | Paused | Busy | Busy | Busy | Streaming | Stopped | Reset |
    pub const fn after(self, transition: Transition) -> Result<StreamState> {
        use StreamState::*;
        match (self, transition) {
            (Reset, Transition::Init) => Ok(Stopped),
            (Stopped, Transition::Start) => Ok(Streaming),
            (Streaming, Transition::Pause) => Ok(Paused),
            (Paused, Transition::Resume) => Ok(Streaming),
            (Stopped | Streaming | Paused, Transition::Stop) => Ok(Stopped),
            (_, Transition::DeInit) => Ok(Reset),
            _ => Err(Error::Busy),
        }
    }

    /// `true` while a buffer is armed on the hardware.
    pub const fn is_active(self) -> bool {
        matches!(self, StreamState::Streaming | StreamState::Paused)
    }
}

/// Everything the subsystem remembers about one stream.
#[derive(Debug)]
pub(crate) struct StreamContext {
    defaults: AudioInit,
    pub(crate) device: Device,
    pub(crate) sample_rate: SampleRate,
    pub(crate) bits_per_sample: BitsPerSample,
    pub(crate) channels: u8,
    pub(crate) volume: u8,
    pub(crate) muted: bool,
    pub(crate) state: StreamState,
    /// Armed buffer; present only while Streaming or Paused.
    pub(crate) buffer: Option<&'static mut [u8]>,
}

impl StreamContext {
    pub(crate) const fn new(defaults: AudioInit) -> Self {
        StreamContext {
            defaults,
            device: defaults.device,
            sample_rate: defaults.sample_rate,
            bits_per_sample: defaults.bits_per_sample,
            channels: defaults.channels,
            volume: defaults.volume,
            muted: false,
            state: StreamState::Reset,
            buffer: None,
        }
    }

    /// Latch an accepted Init configuration.
    pub(crate) fn configure(&mut self, config: &AudioInit) {
        self.device = config.device;
        self.sample_rate = config.sample_rate;
        self.bits_per_sample = config.bits_per_sample;
        self.channels = config.channels;
        self.volume = config.volume;
        self.muted = false;
    }

    /// Back to defaults and `Reset`, dropping any armed buffer.
    pub(crate) fn reset(&mut self) {
        let defaults = self.defaults;
        *self = StreamContext::new(defaults);
    }

    /// Check `transition` against the table without applying it.
    pub(crate) fn check(&self, transition: Transition) -> Result<StreamState> {
        self.state.after(transition)
    }

    pub(crate) fn enter(&mut self, next: StreamState) {
        if self.state != next {
            debug!("stream: {} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Fail with `Busy` unless Stopped.
    pub(crate) fn require_stopped(&self) -> Result<()> {
        match self.state {
            StreamState::Stopped => Ok(()),
            _ => Err(Error::Busy),
        }
    }

    /// Fail with `Busy` while Reset.
    pub(crate) fn require_initialized(&self) -> Result<()> {
        match self.state {
            StreamState::Reset => Err(Error::Busy),
            _ => Ok(()),
        }
    }
}
