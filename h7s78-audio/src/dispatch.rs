//! Transfer-completion dispatch.
//!
//! The DMA controller latches half-complete, complete and error events per
//! channel. The board's interrupt handlers call
//! [`out_irq_handler`](AudioSubsystem::out_irq_handler) or
//! [`in_irq_handler`](AudioSubsystem::in_irq_handler), which drain those
//! events in delivery order, post-process the finished half of the stream
//! buffer and invoke the matching [`AudioCallbacks`] hook.
//!
//! ```text
//!  DMA channel        event          post-processing              hook
//!  ───────────        ─────          ───────────────              ────
//!  SerialAudioTx  ─┬─ half/complete  none                         out_half_transfer / out_transfer_complete
//!                 └─ error ───────┐
//!  SerialAudioRx  ─┬─ half/complete  left → right duplicate       in_half_transfer / in_transfer_complete (0)
//!                 └─ error ───────┴► out_error + in_error(0)
//!  DigitalMicRx   ─┬─ half/complete  ÷256, saturate, pack i16 LE  in_half_transfer / in_transfer_complete (1)
//!                 └─ error ────────► in_error(1)
//! ```
//!
//! Output and analog input share one serial-audio engine, so an error on
//! either of its channels is reported to both.
//!
//! Everything here runs in interrupt context: no blocking, no allocation.

use crate::config::InputInstance;
use crate::hw::{DmaChannel, DmaController, TransferEvent};
use crate::stream::AudioSubsystem;

/// A typed event for one logical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioEvent {
    Output(TransferEvent),
    Input(InputInstance, TransferEvent),
}

impl AudioEvent {
    /// The stream a raw channel event belongs to.
    pub const fn from_channel(channel: DmaChannel, event: TransferEvent) -> Self {
        match channel {
            DmaChannel::SerialAudioTx => AudioEvent::Output(event),
            DmaChannel::SerialAudioRx => AudioEvent::Input(InputInstance::AnalogMic, event),
            DmaChannel::DigitalMicRx => AudioEvent::Input(InputInstance::DigitalMic, event),
        }
    }
}

/// Application hooks invoked from interrupt context.
///
/// Every method has a no-op default; implement only what you need.
///
/// Output hooks receive the half of the playback buffer the hardware has
/// just finished sending, ready to be refilled. Input hooks receive the
/// half that has just been captured and post-processed.
pub trait AudioCallbacks {
    fn out_half_transfer(&mut self, _first_half: &mut [u8]) {}

    fn out_transfer_complete(&mut self, _second_half: &mut [u8]) {}

    fn out_error(&mut self) {}

    fn in_half_transfer(&mut self, _instance: InputInstance, _first_half: &[u8]) {}

    fn in_transfer_complete(&mut self, _instance: InputInstance, _second_half: &[u8]) {}

    fn in_error(&mut self, _instance: InputInstance) {}
}

/// Callbacks that ignore every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallbacks;

impl AudioCallbacks for NoCallbacks {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    First,
    Second,
}

/// Copy each left sample over the right slot of its frame.
///
/// `frames` holds interleaved 16-bit stereo frames (4 bytes each). The
/// analog mic only drives the left channel. A trailing partial frame is
/// left untouched.
pub fn duplicate_left_channel(frames: &mut [u8]) {
    for frame in frames.chunks_exact_mut(4) {
        frame[2] = frame[0];
        frame[3] = frame[1];
    }
}

/// Rescale one raw mic-filter word to a 16-bit sample.
///
/// The division truncates toward zero before saturating.
#[inline(always)]
pub fn rescale_mic_sample(raw: i32) -> i16 {
    saturate16(raw / 256)
}

/// Drain raw mic-filter words into packed little-endian 16-bit samples.
///
/// Converts `min(raw.len(), out.len() / 2)` samples.
pub fn drain_mic_samples(raw: &[i32], out: &mut [u8]) {
    for (dst, &word) in out.chunks_exact_mut(2).zip(raw) {
        dst.copy_from_slice(&rescale_mic_sample(word).to_le_bytes());
    }
}

#[inline(always)]
fn saturate16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

impl<H, C, CB, K, I> AudioSubsystem<H, C, CB, K, I>
where
    H: DmaController,
    CB: AudioCallbacks,
{
    /// Serial-audio transmit channel interrupt.
    pub fn out_irq_handler(&mut self) {
        self.dma_irq_handler(DmaChannel::SerialAudioTx);
    }

    /// Capture channel interrupt for `instance`.
    pub fn in_irq_handler(&mut self, instance: InputInstance) {
        self.dma_irq_handler(instance.dma_channel());
    }

    /// Drain and dispatch every pending event on `channel`, oldest first.
    pub fn dma_irq_handler(&mut self, channel: DmaChannel) {
        while let Some(event) = self.hw.take_event(channel) {
            self.on_event(AudioEvent::from_channel(channel, event));
        }
    }

    /// Dispatch one already-typed event.
    ///
    /// Half and complete events for a stream with no armed buffer are
    /// dropped.
    pub fn on_event(&mut self, event: AudioEvent) {
        let half = match event {
            AudioEvent::Output(TransferEvent::Error)
            | AudioEvent::Input(InputInstance::AnalogMic, TransferEvent::Error) => {
                error!("dispatch: serial-audio transfer error");
                self.callbacks.out_error();
                self.callbacks.in_error(InputInstance::AnalogMic);
                return;
            }
            AudioEvent::Input(InputInstance::DigitalMic, TransferEvent::Error) => {
                error!("dispatch: digital-mic transfer error");
                self.callbacks.in_error(InputInstance::DigitalMic);
                return;
            }
            AudioEvent::Output(TransferEvent::HalfComplete)
            | AudioEvent::Input(_, TransferEvent::HalfComplete) => Half::First,
            AudioEvent::Output(TransferEvent::Complete) | AudioEvent::Input(_, TransferEvent::Complete) => {
                Half::Second
            }
        };

        match event {
            AudioEvent::Output(_) => self.output_done(half),
            AudioEvent::Input(InputInstance::AnalogMic, _) => self.analog_mic_done(half),
            AudioEvent::Input(InputInstance::DigitalMic, _) => self.digital_mic_done(half),
        }
    }

    fn output_done(&mut self, half: Half) {
        let Some(buffer) = self.output.buffer.as_deref_mut() else {
            trace!("dispatch: output event without buffer");
            return;
        };
        let mid = buffer.len() / 2;
        match half {
            Half::First => self.callbacks.out_half_transfer(&mut buffer[..mid]),
            Half::Second => self.callbacks.out_transfer_complete(&mut buffer[mid..]),
        }
    }

    fn analog_mic_done(&mut self, half: Half) {
        let instance = InputInstance::AnalogMic;
        let Some(buffer) = self.inputs[instance.index()].buffer.as_deref_mut() else {
            trace!("dispatch: analog-mic event without buffer");
            return;
        };
        let mid = buffer.len() / 2;
        let region = match half {
            Half::First => &mut buffer[..mid],
            Half::Second => &mut buffer[mid..],
        };
        duplicate_left_channel(region);
        match half {
            Half::First => self.callbacks.in_half_transfer(instance, region),
            Half::Second => self.callbacks.in_transfer_complete(instance, region),
        }
    }

    fn digital_mic_done(&mut self, half: Half) {
        let instance = InputInstance::DigitalMic;
        let Some(buffer) = self.inputs[instance.index()].buffer.as_deref_mut() else {
            trace!("dispatch: digital-mic event without buffer");
            return;
        };
        // One raw word per output sample; Record bounds this by the scratch length.
        let samples = (buffer.len() / 2).min(self.scratch.len());
        let mid = samples / 2;
        let (raw, out) = match half {
            Half::First => (&self.scratch[..mid], &mut buffer[..mid * 2]),
            Half::Second => (&self.scratch[mid..samples], &mut buffer[mid * 2..samples * 2]),
        };
        drain_mic_samples(raw, out);
        match half {
            Half::First => self.callbacks.in_half_transfer(instance, out),
            Half::Second => self.callbacks.in_transfer_complete(instance, out),
        }
    }
}
