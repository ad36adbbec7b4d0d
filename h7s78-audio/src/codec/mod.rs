//! Codec capability interface and one-time binding.
//!
//! The subsystem talks to the codec only through [`AudioCodec`], the fixed
//! capability set {init, deinit, play, pause, resume, stop, set_mute,
//! set_volume}. The concrete chip sits behind it:
//!
//! | Driver | Feature | Chip |
//! |--------|---------|------|
//! | [`Wm8904`] | `wm8904` (default) | Cirrus/Wolfson WM8904 on the discovery kit |
//!
//! Before first use the codec is identified with [`CodecProbe::read_id`].
//! [`CodecBinding`] remembers a successful probe until both codec users are
//! torn down, so repeated Init calls do not touch the bus again.

#[cfg(feature = "wm8904")]
pub(crate) mod registers;
#[cfg(feature = "wm8904")]
mod wm8904;

#[cfg(feature = "wm8904")]
pub use wm8904::{Wm8904, Wm8904Error};

use crate::config::{BitsPerSample, SampleRate};
use crate::constants::{WM8904_ID, WM8904_ID_MASK};
use crate::error::Error;

/// Codec signal path selected at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecPath {
    /// DAC to headphone jack, no input.
    Headphone,
    /// Analog microphone to ADC, no output.
    AnalogMic,
}

/// Which volume control [`AudioCodec::set_volume`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VolumeTarget {
    Output,
    Input,
}

/// Parameters handed to [`AudioCodec::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CodecInit {
    pub path: CodecPath,
    pub sample_rate: SampleRate,
    pub bits_per_sample: BitsPerSample,
    /// Percentage, 0–100.
    pub volume: u8,
}

/// Fixed capability set of an audio codec.
///
/// Volumes are percentages; the driver maps them onto its own gain range.
pub trait AudioCodec {
    type Error;

    fn init(&mut self, config: &CodecInit) -> Result<(), Self::Error>;
    fn deinit(&mut self) -> Result<(), Self::Error>;
    fn play(&mut self) -> Result<(), Self::Error>;
    fn pause(&mut self) -> Result<(), Self::Error>;
    fn resume(&mut self) -> Result<(), Self::Error>;
    fn stop(&mut self) -> Result<(), Self::Error>;
    fn set_mute(&mut self, mute: bool) -> Result<(), Self::Error>;
    fn set_volume(&mut self, target: VolumeTarget, percent: u8) -> Result<(), Self::Error>;
}

/// Bus identification of a codec chip.
pub trait CodecProbe {
    type Error;

    /// Identifier compared against [`expected_id`](Self::expected_id).
    fn read_id(&mut self) -> Result<u32, Self::Error>;

    fn expected_id(&self) -> u32 {
        WM8904_ID
    }

    fn id_mask(&self) -> u32 {
        WM8904_ID_MASK
    }
}

/// Why binding to the codec failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeError {
    /// The ID register could not be read.
    Bus,
    /// The chip answered with a different identifier.
    UnknownId(u32),
}

impl From<ProbeError> for Error {
    fn from(e: ProbeError) -> Self {
        match e {
            ProbeError::Bus => Error::BusFailure,
            ProbeError::UnknownId(_) => Error::UnknownComponent,
        }
    }
}

/// A codec plus the record of whether it has been identified.
#[derive(Debug)]
pub struct CodecBinding<C> {
    codec: C,
    bound: bool,
}

impl<C> CodecBinding<C> {
    pub const fn new(codec: C) -> Self {
        CodecBinding { codec, bound: false }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// The codec, only once bound.
    pub fn get_mut(&mut self) -> Option<&mut C> {
        if self.bound {
            Some(&mut self.codec)
        } else {
            None
        }
    }

    /// Forget the binding; the next [`bind`](Self::bind) probes again.
    pub fn unbind(&mut self) {
        if self.bound {
            debug!("codec: unbound");
        }
        self.bound = false;
    }

    #[cfg(test)]
    pub(crate) fn get_mut_unchecked(&mut self) -> &mut C {
        &mut self.codec
    }

    /// Give the codec back, bound or not.
    pub fn release(self) -> C {
        self.codec
    }
}

impl<C: CodecProbe> CodecBinding<C> {
    /// Identify the codec unless already bound.
    ///
    /// A failed probe leaves the binding unbound and is not retried here.
    pub fn bind(&mut self) -> Result<&mut C, ProbeError> {
        if !self.bound {
            let id = self.codec.read_id().map_err(|_| ProbeError::Bus)?;
            if id & self.codec.id_mask() != self.codec.expected_id() {
                warn!("codec: unexpected id {=u32:#x}", id);
                return Err(ProbeError::UnknownId(id));
            }
            info!("codec: bound, id {=u32:#x}", id);
            self.bound = true;
        }
        Ok(&mut self.codec)
    }
}
