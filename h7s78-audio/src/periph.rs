//! Peripheral bring-up for the serial-audio port and the mic filter.
//!
//! [`PeripheralInit`] is the overridable strategy; [`DefaultPeripheralInit`]
//! uses the board defaults below.

use crate::config::{BitsPerSample, SampleRate};
use crate::hw::{Direction, HwError, MicFilterPort, SerialAudioConfig, SerialAudioPort};

/// CIC filter order used by the mic-filter main stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CicMode {
    Sinc4,
}

/// Serial interface framing of the PDM microphone input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialInterfaceMode {
    /// SPI-style, data sampled on the falling edge of the output clock.
    NormalSpi,
}

/// Complete mic-filter configuration applied at Init and SetSampleRate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MicFilterConfig {
    pub sample_rate: SampleRate,
    /// Kernel clock to processing clock.
    pub proc_clock_divider: u8,
    /// Processing clock to microphone bit clock.
    pub output_clock_divider: u8,
    /// CIC decimation ratio.
    pub decimation_ratio: u8,
    /// Gain applied after the CIC stage, in 3 dB steps.
    pub gain: i8,
    pub cic_mode: CicMode,
    pub interface: SerialInterfaceMode,
    /// Serial interface clock-absence threshold.
    pub threshold: u8,
    /// Reshape filter decimation ratio.
    pub reshape_decimation: u8,
    pub high_pass_filter: bool,
}

impl MicFilterConfig {
    /// Board defaults for `rate`.
    ///
    /// | Rate | Decim | Gain | Proc div | Out div |
    /// |------|-------|------|----------|---------|
    /// | 8 k | 64 | -4 | 2 | 12 |
    /// | 11.025 k | 64 | -6 | 1 | 4 |
    /// | 16 k | 32 | 2 | 2 | 12 |
    /// | 22.05 k | 32 | 2 | 1 | 4 |
    /// | 32 k | 16 | 10 | 2 | 12 |
    /// | 44.1 k | 16 | 10 | 1 | 4 |
    /// | 48 k | 16 | 10 | 2 | 8 |
    /// | 88.2 k | 8 | 18 | 1 | 16 |
    /// | 96 k | 8 | 18 | 2 | 16 |
    /// | 176.4 k | 4 | 24 | 1 | 16 |
    /// | 192 k | 4 | 24 | 2 | 16 |
    pub const fn for_rate(rate: SampleRate) -> Self {
        use SampleRate::*;
        let (decimation_ratio, gain, proc_clock_divider, output_clock_divider) = match rate {
            Hz8000 => (64, -4, 2, 12),
            Hz11025 => (64, -6, 1, 4),
            Hz16000 => (32, 2, 2, 12),
            Hz22050 => (32, 2, 1, 4),
            Hz32000 => (16, 10, 2, 12),
            Hz44100 => (16, 10, 1, 4),
            Hz48000 => (16, 10, 2, 8),
            Hz88200 => (8, 18, 1, 16),
            Hz96000 => (8, 18, 2, 16),
            Hz176400 => (4, 24, 1, 16),
            Hz192000 => (4, 24, 2, 16),
        };
        MicFilterConfig {
            sample_rate: rate,
            proc_clock_divider,
            output_clock_divider,
            decimation_ratio,
            gain,
            cic_mode: CicMode::Sinc4,
            interface: SerialInterfaceMode::NormalSpi,
            threshold: 31,
            reshape_decimation: 4,
            high_pass_filter: true,
        }
    }
}

impl SerialAudioConfig {
    /// Master transmit or receive with MCLK routed to the codec.
    pub const fn master(direction: Direction, sample_rate: SampleRate, bits_per_sample: BitsPerSample) -> Self {
        SerialAudioConfig {
            direction,
            sample_rate,
            bits_per_sample,
            mclk_output: true,
        }
    }
}

/// Peripheral initialisation strategy.
pub trait PeripheralInit {
    fn serial_audio<H>(&mut self, hw: &mut H, config: &SerialAudioConfig) -> Result<(), HwError>
    where
        H: SerialAudioPort,
    {
        hw.init(config)
    }

    fn mic_filter<H>(&mut self, hw: &mut H, rate: SampleRate) -> Result<(), HwError>
    where
        H: MicFilterPort,
    {
        hw.init(&MicFilterConfig::for_rate(rate))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPeripheralInit;

impl PeripheralInit for DefaultPeripheralInit {}
