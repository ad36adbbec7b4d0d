//! Stream configuration: sample rates, bit depths, devices and instances.
//!
//! Every raw `u32` crossing in from a foreign boundary goes through
//! `TryFrom`, so an unknown rate or instance index becomes
//! [`Error::WrongParam`] before any state is touched.

use crate::error::Error;

/// Discrete sample rates supported by the board's clock tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    Hz8000,
    Hz11025,
    Hz16000,
    Hz22050,
    Hz32000,
    Hz44100,
    Hz48000,
    Hz88200,
    Hz96000,
    Hz176400,
    Hz192000,
}

impl SampleRate {
    /// All rates in ascending order.
    pub const ALL: [SampleRate; 11] = [
        SampleRate::Hz8000,
        SampleRate::Hz11025,
        SampleRate::Hz16000,
        SampleRate::Hz22050,
        SampleRate::Hz32000,
        SampleRate::Hz44100,
        SampleRate::Hz48000,
        SampleRate::Hz88200,
        SampleRate::Hz96000,
        SampleRate::Hz176400,
        SampleRate::Hz192000,
    ];

    /// Rate in hertz.
    pub const fn hz(self) -> u32 {
        match self {
            SampleRate::Hz8000 => 8_000,
            SampleRate::Hz11025 => 11_025,
            SampleRate::Hz16000 => 16_000,
            SampleRate::Hz22050 => 22_050,
            SampleRate::Hz32000 => 32_000,
            SampleRate::Hz44100 => 44_100,
            SampleRate::Hz48000 => 48_000,
            SampleRate::Hz88200 => 88_200,
            SampleRate::Hz96000 => 96_000,
            SampleRate::Hz176400 => 176_400,
            SampleRate::Hz192000 => 192_000,
        }
    }

    /// `true` for the 11.025 kHz family (needs the 11.2896 MHz-based clock).
    pub const fn is_44k1_family(self) -> bool {
        matches!(
            self,
            SampleRate::Hz11025
                | SampleRate::Hz22050
                | SampleRate::Hz44100
                | SampleRate::Hz88200
                | SampleRate::Hz176400
        )
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = Error;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        SampleRate::ALL
            .iter()
            .copied()
            .find(|rate| rate.hz() == hz)
            .ok_or(Error::WrongParam)
    }
}

/// Sample resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitsPerSample {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl BitsPerSample {
    pub const fn bits(self) -> u32 {
        match self {
            BitsPerSample::Bits8 => 8,
            BitsPerSample::Bits16 => 16,
            BitsPerSample::Bits24 => 24,
            BitsPerSample::Bits32 => 32,
        }
    }

    /// Bytes moved per DMA transfer unit on the serial-audio port.
    ///
    /// 24-bit samples travel right-aligned in 32-bit words.
    pub const fn bytes_per_transfer(self) -> usize {
        match self {
            BitsPerSample::Bits8 => 1,
            BitsPerSample::Bits16 => 2,
            BitsPerSample::Bits24 | BitsPerSample::Bits32 => 4,
        }
    }
}

impl TryFrom<u32> for BitsPerSample {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitsPerSample::Bits8),
            16 => Ok(BitsPerSample::Bits16),
            24 => Ok(BitsPerSample::Bits24),
            32 => Ok(BitsPerSample::Bits32),
            _ => Err(Error::WrongParam),
        }
    }
}

/// Playback device. The board routes the codec to a single headphone jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDevice {
    #[default]
    Headphone,
}

/// Capture device. Each input instance has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputDevice {
    /// Analog microphone through the codec ADC and serial-audio port.
    AnalogMic,
    /// PDM microphone through the digital-mic decimation filter.
    DigitalMic,
}

/// Logical input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputInstance {
    /// Instance 0: stereo, 16-bit, shares the serial-audio port with output.
    AnalogMic = 0,
    /// Instance 1: mono, 16-bit, independent decimation-filter engine.
    DigitalMic = 1,
}

impl InputInstance {
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The only device this instance can capture from.
    pub const fn device(self) -> InputDevice {
        match self {
            InputInstance::AnalogMic => InputDevice::AnalogMic,
            InputInstance::DigitalMic => InputDevice::DigitalMic,
        }
    }

    /// Fixed channel count of the path.
    pub const fn channels(self) -> u8 {
        match self {
            InputInstance::AnalogMic => 2,
            InputInstance::DigitalMic => 1,
        }
    }
}

impl TryFrom<u32> for InputInstance {
    type Error = Error;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(InputInstance::AnalogMic),
            1 => Ok(InputInstance::DigitalMic),
            _ => Err(Error::WrongParam),
        }
    }
}

/// Device selector carried by [`AudioInit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Device {
    Output(OutputDevice),
    Input(InputDevice),
}

/// Parameters accepted by the Init operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioInit {
    pub device: Device,
    pub sample_rate: SampleRate,
    pub bits_per_sample: BitsPerSample,
    pub channels: u8,
    /// Percentage, 0–100.
    pub volume: u8,
}

impl AudioInit {
    /// Headphone playback, 8 kHz, 16-bit stereo, volume 50.
    pub const fn output() -> Self {
        AudioInit {
            device: Device::Output(OutputDevice::Headphone),
            sample_rate: SampleRate::Hz8000,
            bits_per_sample: BitsPerSample::Bits16,
            channels: 2,
            volume: 50,
        }
    }

    /// Analog-mic capture, 8 kHz, 16-bit stereo, volume 50.
    pub const fn analog_mic() -> Self {
        AudioInit {
            device: Device::Input(InputDevice::AnalogMic),
            sample_rate: SampleRate::Hz8000,
            bits_per_sample: BitsPerSample::Bits16,
            channels: 2,
            volume: 50,
        }
    }

    /// Digital-mic capture, 8 kHz, 16-bit mono.
    pub const fn digital_mic() -> Self {
        AudioInit {
            device: Device::Input(InputDevice::DigitalMic),
            sample_rate: SampleRate::Hz8000,
            bits_per_sample: BitsPerSample::Bits16,
            channels: 1,
            volume: 50,
        }
    }

    pub const fn with_sample_rate(mut self, rate: SampleRate) -> Self {
        self.sample_rate = rate;
        self
    }

    pub const fn with_bits_per_sample(mut self, bits: BitsPerSample) -> Self {
        self.bits_per_sample = bits;
        self
    }

    pub const fn with_channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    pub const fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }
}
