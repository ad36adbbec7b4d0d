//! Stream state machines and the public audio API.
//!
//! [`AudioSubsystem`] owns one output stream and two input streams and
//! arbitrates the hardware between them:
//!
//! ```text
//!   output ──────────┐                       ┌── SPI6 (serial audio) ── codec
//!                    ├── exclusive, checked ─┤
//!   input 0 (analog)─┘        at Init        │
//!                                            │
//!   input 1 (digital mic) ────────────────────── ADF1 (mic filter)
//! ```
//!
//! Output and analog input both need the single serial-audio port in one
//! direction, so at most one of them is out of `Reset` at a time. The digital
//! mic has its own filter engine and runs alongside either.
//!
//! Every operation checks the stream's [`StreamState`] first and returns
//! [`Error::Busy`] when the transition table forbids it. Hardware is touched
//! only after all checks pass. A failed Init leaves the stream in `Reset`, a
//! failed Start leaves it `Stopped`.
//!
//! ## Buffer ownership
//!
//! Play and Record take a `&'static mut [u8]`. The subsystem keeps it while
//! the stream is Streaming or Paused and hands it back from Stop. Completion
//! callbacks see the half the hardware just finished with.
//!
//! ## Usage
//!
//! ```ignore
//! let mut audio = AudioSubsystem::new(board, Wm8904::new(i2c, delay), MyCallbacks, scratch);
//! audio.init_output(&AudioInit::output().with_sample_rate(SampleRate::Hz48000))?;
//! audio.play(buffer)?;
//!
//! // DMA interrupt for the serial-audio transmit channel:
//! audio.out_irq_handler();
//! ```

mod input;
mod output;
mod state;

pub use state::{StreamState, Transition};

pub(crate) use state::StreamContext;

use crate::clock::DefaultClockConfig;
use crate::codec::{AudioCodec, CodecBinding};
use crate::config::{AudioInit, InputInstance};
use crate::dma::DescriptorQueues;
use crate::error::Error;
use crate::periph::DefaultPeripheralInit;

/// How far an Init got on the peripheral side before it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BringUp {
    Untouched,
    /// Pins and bus clock enabled.
    Msp,
    /// Peripheral initialised.
    Port,
}

/// A buffer-carrying operation failed.
///
/// Holds the caller's buffer when the subsystem had taken it, so it is
/// never lost on an error path.
#[derive(Debug)]
pub struct BufferError {
    pub error: Error,
    pub buffer: Option<&'static mut [u8]>,
}

impl BufferError {
    pub(crate) fn new(error: Error, buffer: &'static mut [u8]) -> Self {
        BufferError { error, buffer: Some(buffer) }
    }

    pub(crate) fn bare(error: Error) -> Self {
        BufferError { error, buffer: None }
    }
}

impl From<BufferError> for Error {
    fn from(e: BufferError) -> Self {
        e.error
    }
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.error, f)
    }
}

impl core::error::Error for BufferError {}

/// The board audio subsystem.
///
/// - `H` board hardware, see [`AudioHardware`](crate::hw::AudioHardware)
/// - `C` codec driver
/// - `CB` completion callbacks, see [`AudioCallbacks`](crate::dispatch::AudioCallbacks)
/// - `K` / `I` clock and peripheral bring-up strategies
pub struct AudioSubsystem<H, C, CB, K = DefaultClockConfig, I = DefaultPeripheralInit> {
    pub(crate) hw: H,
    pub(crate) codec: CodecBinding<C>,
    pub(crate) callbacks: CB,
    pub(crate) clock: K,
    pub(crate) periph: I,
    pub(crate) queues: DescriptorQueues,
    pub(crate) output: StreamContext,
    pub(crate) inputs: [StreamContext; 2],
    /// Raw filter words for the digital mic, drained into the caller's buffer.
    pub(crate) scratch: &'static mut [i32],
}

impl<H, C, CB> AudioSubsystem<H, C, CB> {
    /// Subsystem with the built-in clock tables and peripheral defaults.
    ///
    /// `scratch` bounds the digital-mic record length: a record of `n`
    /// bytes needs `n / 2` words (see
    /// [`DIGITAL_MIC_SCRATCH_WORDS`](crate::constants::DIGITAL_MIC_SCRATCH_WORDS)).
    pub fn new(hw: H, codec: C, callbacks: CB, scratch: &'static mut [i32]) -> Self {
        Self::with_strategies(hw, codec, callbacks, scratch, DefaultClockConfig, DefaultPeripheralInit)
    }
}

impl<H, C, CB, K, I> AudioSubsystem<H, C, CB, K, I> {
    pub fn with_strategies(
        hw: H,
        codec: C,
        callbacks: CB,
        scratch: &'static mut [i32],
        clock: K,
        periph: I,
    ) -> Self {
        AudioSubsystem {
            hw,
            codec: CodecBinding::new(codec),
            callbacks,
            clock,
            periph,
            queues: DescriptorQueues::new(),
            output: StreamContext::new(AudioInit::output()),
            inputs: [
                StreamContext::new(AudioInit::analog_mic()),
                StreamContext::new(AudioInit::digital_mic()),
            ],
            scratch,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn callbacks(&self) -> &CB {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CB {
        &mut self.callbacks
    }

    /// The DMA descriptor chains, for inspection.
    pub fn queues(&self) -> &DescriptorQueues {
        &self.queues
    }

    pub fn is_codec_bound(&self) -> bool {
        self.codec.is_bound()
    }

    /// Tear apart into hardware, codec, callbacks and scratch.
    ///
    /// Streams are not stopped; call the DeInit operations first.
    pub fn release(self) -> (H, C, CB, &'static mut [i32]) {
        (self.hw, self.codec.release(), self.callbacks, self.scratch)
    }

    pub(crate) fn input(&self, instance: InputInstance) -> &StreamContext {
        &self.inputs[instance.index()]
    }

    /// Drop the codec binding once neither of its users is initialised.
    pub(crate) fn unbind_codec_if_idle(&mut self) {
        let analog = &self.inputs[InputInstance::AnalogMic.index()];
        if self.output.state == StreamState::Reset && analog.state == StreamState::Reset {
            self.codec.unbind();
        }
    }
}

/// Run `f` on the bound codec, mapping any driver error to
/// [`Error::ComponentFailure`].
pub(crate) fn codec_call<C, T, F>(binding: &mut CodecBinding<C>, what: &'static str, f: F) -> Result<T, Error>
where
    C: AudioCodec,
    F: FnOnce(&mut C) -> Result<T, C::Error>,
{
    let codec = binding.get_mut().ok_or(Error::ComponentFailure)?;
    f(codec).map_err(|_| {
        warn!("codec: {} failed", what);
        Error::ComponentFailure
    })
}

/// Keep the first error of a teardown sequence.
pub(crate) fn first_error(slot: &mut Option<Error>, result: Result<(), Error>) {
    if let Err(e) = result {
        slot.get_or_insert(e);
    }
}

