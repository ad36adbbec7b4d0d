//! Hardware capabilities consumed by the audio subsystem.
//!
//! The subsystem never touches registers directly. A board crate implements
//! these traits on top of its PAC/HAL and hands one value implementing
//! [`AudioHardware`] to [`AudioSubsystem`](crate::stream::AudioSubsystem).
//!
//! ```text
//!            ┌────────────────────────── AudioHardware ─────────────────────────┐
//!            │ ClockTree     SerialAudioPort     MicFilterPort    DmaController │
//!            │  PLL2/PLL3     SPI6 (I2S)          ADF1 (PDM)       3 channels   │
//!            └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! GPIO and clock-gate setup (`msp_init` / `msp_deinit`) is treated as
//! infallible. Everything else reports a [`HwError`] that the caller maps to
//! the public [`Error`](crate::Error) taxonomy.

use embedded_hal::delay::DelayNs;

use crate::clock::PllSettings;
use crate::config::{BitsPerSample, SampleRate};
use crate::dma::DescriptorQueue;
use crate::periph::MicFilterConfig;

/// Failure reported by a hardware primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwError {
    /// The peripheral rejected the request.
    Fault,
    /// A ready flag did not assert in time.
    Timeout,
    /// The peripheral is mid-operation.
    Busy,
}

// ── Clock tree ──────────────────────────────────────────────────────

/// Dedicated audio PLLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pll {
    /// Feeds the serial-audio kernel clock from its Q output.
    Pll2,
    /// Feeds the mic-filter kernel clock from its P output.
    Pll3,
}

/// Peripheral kernel-clock multiplexer selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KernelClock {
    /// SPI6 (serial audio) clocked from PLL2 Q.
    Spi6FromPll2Q,
    /// ADF1 (mic filter) clocked from PLL3 P.
    Adf1FromPll3P,
}

/// Reset and clock control as far as the audio clocks are concerned.
pub trait ClockTree {
    /// `true` once the base oscillator feeding the PLLs is running.
    fn base_clock_ready(&self) -> bool;

    /// Program dividers and enable the PLL. Lock is polled separately.
    fn enable_pll(&mut self, pll: Pll, settings: &PllSettings) -> Result<(), HwError>;

    /// Hardware lock flag.
    fn pll_locked(&self, pll: Pll) -> bool;

    fn select_kernel_clock(&mut self, selection: KernelClock) -> Result<(), HwError>;
}

// ── Serial audio port ───────────────────────────────────────────────

/// Transfer direction on the serial-audio port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Transmit,
    Receive,
}

/// Serial-audio port configuration.
///
/// The port is always the clock master in Philips I2S framing with the
/// master clock routed to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialAudioConfig {
    pub direction: Direction,
    pub sample_rate: SampleRate,
    pub bits_per_sample: BitsPerSample,
    pub mclk_output: bool,
}

/// Synchronous serial audio interface shared by playback and analog capture.
pub trait SerialAudioPort {
    /// Pins, peripheral clock gate, interrupt priority.
    fn msp_init(&mut self);
    fn msp_deinit(&mut self);

    fn init(&mut self, config: &SerialAudioConfig) -> Result<(), HwError>;
    fn deinit(&mut self) -> Result<(), HwError>;

    /// Start a circular DMA transfer of `units` data-width words.
    ///
    /// `buffer` stays owned by the caller and must remain valid until
    /// [`stop`](Self::stop) returns.
    fn start(&mut self, direction: Direction, buffer: *mut u8, units: u16) -> Result<(), HwError>;
    fn pause(&mut self, direction: Direction) -> Result<(), HwError>;
    fn resume(&mut self, direction: Direction) -> Result<(), HwError>;
    fn stop(&mut self, direction: Direction) -> Result<(), HwError>;
}

// ── Mic filter port ─────────────────────────────────────────────────

/// Digital-microphone decimation filter.
pub trait MicFilterPort {
    fn msp_init(&mut self);
    fn msp_deinit(&mut self);

    fn init(&mut self, config: &MicFilterConfig) -> Result<(), HwError>;
    fn deinit(&mut self) -> Result<(), HwError>;

    /// Start acquiring into `scratch`, `bytes` long, in circular mode.
    fn start_acquisition(&mut self, scratch: *mut i32, bytes: u32) -> Result<(), HwError>;
    fn stop_acquisition(&mut self) -> Result<(), HwError>;
}

// ── DMA controller ──────────────────────────────────────────────────

/// The three DMA channels the subsystem owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaChannel {
    SerialAudioTx,
    SerialAudioRx,
    DigitalMicRx,
}

impl DmaChannel {
    pub const ALL: [DmaChannel; 3] = [
        DmaChannel::SerialAudioTx,
        DmaChannel::SerialAudioRx,
        DmaChannel::DigitalMicRx,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Raw event latched by a DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferEvent {
    HalfComplete,
    Complete,
    Error,
}

/// Linked-list DMA controller.
pub trait DmaController {
    /// Initialise the channel in linked-list mode and attach `queue`.
    fn link(&mut self, channel: DmaChannel, queue: &DescriptorQueue) -> Result<(), HwError>;

    /// Reload the head node of an attached chain after it was replaced.
    ///
    /// Only called on a linked, idle channel; the chain is circular again
    /// by the time this runs.
    fn update_head(&mut self, channel: DmaChannel, queue: &DescriptorQueue) -> Result<(), HwError>;

    /// Detach the queue and return the channel to reset state.
    fn unlink(&mut self, channel: DmaChannel) -> Result<(), HwError>;

    fn set_irq_enabled(&mut self, channel: DmaChannel, enabled: bool);

    /// Pop the oldest pending event, acknowledging its flag.
    fn take_event(&mut self, channel: DmaChannel) -> Option<TransferEvent>;
}

/// Everything the subsystem needs from the board, plus a millisecond delay
/// for bounded bring-up waits.
pub trait AudioHardware: ClockTree + SerialAudioPort + MicFilterPort + DmaController + DelayNs {}

impl<T> AudioHardware for T where T: ClockTree + SerialAudioPort + MicFilterPort + DmaController + DelayNs {}
