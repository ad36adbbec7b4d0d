//! Audio clock configuration.
//!
//! Two independent trees derive audio kernel clocks from the 64 MHz base
//! oscillator, each through its own PLL with a fixed pre-divider of 32
//! (2 MHz reference):
//!
//! | Tree | PLL | Tap | Kernel mux |
//! |------|-----|-----|------------|
//! | serial audio | PLL2 | Q | SPI6 |
//! | digital mic | PLL3 | P | ADF1 |
//!
//! Multiplier and divider values come from rate-keyed tables. They are
//! chosen so the resulting kernel clock is an integer multiple of the
//! sample-rate family (11.2896 MHz-ish for 44.1 kHz, 49.152 MHz-ish for 48 kHz),
//! not computed at run time.
//!
//! Configuration is overridable: implement [`ClockConfig`] and pass it to
//! [`AudioSubsystem::with_strategies`](crate::stream::AudioSubsystem::with_strategies).

use embedded_hal::delay::DelayNs;

use crate::config::SampleRate;
use crate::constants::{BASE_CLOCK_HZ, PLL_LOCK_TIMEOUT_MS};
use crate::error::Error;
use crate::hw::{ClockTree, HwError, KernelClock, Pll};

/// PLL output tap driving a kernel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllTap {
    P,
    Q,
}

/// One PLL programming: `f_out = f_base / m * n / divider` on `tap`.
///
/// Unused taps are left at their reset dividers and fractional mode off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllSettings {
    pub m: u32,
    pub n: u32,
    pub divider: u32,
    pub tap: PllTap,
}

impl PllSettings {
    const fn q(n: u32, divider: u32) -> Self {
        PllSettings { m: 32, n, divider, tap: PllTap::Q }
    }

    const fn p(n: u32, divider: u32) -> Self {
        PllSettings { m: 32, n, divider, tap: PllTap::P }
    }

    /// VCO frequency for the given base clock.
    pub const fn vco_hz(&self, base_hz: u32) -> u32 {
        base_hz / self.m * self.n
    }

    /// Frequency on the tapped output for the given base clock.
    pub const fn output_hz(&self, base_hz: u32) -> u32 {
        self.vco_hz(base_hz) / self.divider
    }
}

/// Which of the two audio clock trees to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDomain {
    SerialAudio,
    DigitalMic,
}

impl ClockDomain {
    pub const fn pll(self) -> Pll {
        match self {
            ClockDomain::SerialAudio => Pll::Pll2,
            ClockDomain::DigitalMic => Pll::Pll3,
        }
    }

    pub const fn kernel_clock(self) -> KernelClock {
        match self {
            ClockDomain::SerialAudio => KernelClock::Spi6FromPll2Q,
            ClockDomain::DigitalMic => KernelClock::Adf1FromPll3P,
        }
    }

    /// Table lookup for `rate` on this tree.
    pub const fn pll_settings(self, rate: SampleRate) -> PllSettings {
        match self {
            ClockDomain::SerialAudio => serial_audio_pll(rate),
            ClockDomain::DigitalMic => digital_mic_pll(rate),
        }
    }
}

/// PLL2 / Q table for the serial-audio kernel clock.
const fn serial_audio_pll(rate: SampleRate) -> PllSettings {
    use SampleRate::*;
    match rate {
        // 192 MHz / 17 = 11.294 MHz
        Hz11025 | Hz22050 | Hz44100 => PllSettings::q(96, 17),
        // 768 MHz / 17 = 45.176 MHz
        Hz88200 | Hz176400 => PllSettings::q(384, 17),
        // 344 MHz / 7 = 49.142 MHz
        Hz8000 | Hz16000 | Hz32000 | Hz48000 | Hz96000 | Hz192000 => PllSettings::q(172, 7),
    }
}

/// PLL3 / P table for the mic-filter kernel clock.
const fn digital_mic_pll(rate: SampleRate) -> PllSettings {
    use SampleRate::*;
    match rate {
        Hz11025 | Hz22050 | Hz44100 => PllSettings::p(96, 17),
        Hz88200 | Hz176400 => PllSettings::p(384, 17),
        // 688 MHz / 7 = 98.285 MHz
        Hz96000 | Hz192000 => PllSettings::p(344, 7),
        Hz8000 | Hz16000 | Hz32000 | Hz48000 => PllSettings::p(172, 7),
    }
}

/// Why a clock tree could not be brought up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// The base oscillator is not running.
    BaseClockNotReady,
    /// The PLL refused the programming.
    PllRejected(HwError),
    /// The PLL did not report lock within [`PLL_LOCK_TIMEOUT_MS`].
    PllLockTimeout,
    /// The kernel-clock multiplexer refused the selection.
    MuxRejected(HwError),
}

impl From<ClockError> for Error {
    fn from(_: ClockError) -> Self {
        Error::ClockFailure
    }
}

/// Program `domain`'s PLL for `rate`, wait for lock, then route it to the
/// peripheral's kernel clock.
pub fn configure<H>(hw: &mut H, domain: ClockDomain, rate: SampleRate) -> Result<PllSettings, ClockError>
where
    H: ClockTree + DelayNs,
{
    if !hw.base_clock_ready() {
        return Err(ClockError::BaseClockNotReady);
    }

    let settings = domain.pll_settings(rate);
    let pll = domain.pll();
    hw.enable_pll(pll, &settings).map_err(ClockError::PllRejected)?;

    let mut waited_ms = 0;
    while !hw.pll_locked(pll) {
        if waited_ms >= PLL_LOCK_TIMEOUT_MS {
            return Err(ClockError::PllLockTimeout);
        }
        hw.delay_ms(1);
        waited_ms += 1;
    }

    hw.select_kernel_clock(domain.kernel_clock())
        .map_err(ClockError::MuxRejected)?;

    debug!(
        "clock: {} at {} Hz -> {} Hz kernel",
        domain,
        rate.hz(),
        settings.output_hz(BASE_CLOCK_HZ)
    );
    Ok(settings)
}

/// Clock bring-up strategy.
///
/// Both methods default to [`configure`] with the built-in tables. Override
/// to run a board-specific sequence (for example an external audio crystal).
pub trait ClockConfig {
    fn serial_audio_clock<H>(&mut self, hw: &mut H, rate: SampleRate) -> Result<(), ClockError>
    where
        H: ClockTree + DelayNs,
    {
        configure(hw, ClockDomain::SerialAudio, rate).map(|_| ())
    }

    fn digital_mic_clock<H>(&mut self, hw: &mut H, rate: SampleRate) -> Result<(), ClockError>
    where
        H: ClockTree + DelayNs,
    {
        configure(hw, ClockDomain::DigitalMic, rate).map(|_| ())
    }
}

/// Table-driven clock configuration from the internal 64 MHz oscillator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClockConfig;

impl ClockConfig for DefaultClockConfig {}
