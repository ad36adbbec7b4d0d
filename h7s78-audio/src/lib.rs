//! # h7s78-audio
//!
//! A `no_std` audio input/output subsystem for the
//! [STM32H7S78-DK](https://www.st.com/en/evaluation-tools/stm32h7s78-dk.html)
//! discovery kit. Playback and analog capture run over the SPI6 serial-audio
//! port into a WM8904 codec; the on-board digital microphone runs through the
//! ADF1 decimation filter. All three streams are double-buffered circular DMA
//! transfers driven by per-stream state machines.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | API | [`stream`] | [`AudioSubsystem`]: Init / Play / Record / Pause / Resume / Stop / Set* / Get* |
//! | Interrupt | [`dispatch`] | Event routing, post-processing, [`AudioCallbacks`] |
//! | DMA | [`dma`] | Fixed-capacity circular descriptor chains |
//! | Clocks | [`clock`] | Rate-keyed PLL tables for both audio clock trees |
//! | Peripherals | [`periph`] | Serial-audio and mic-filter configuration |
//! | Codec | [`codec`] | Codec capability trait, bus probe, WM8904 driver (feature-gated) |
//! | Board | [`hw`] | Traits the board crate implements over its PAC/HAL |
//! | Sharing | [`shared`] | Critical-section slot for thread and interrupt access |
//!
//! ## Quick start
//!
//! ```ignore
//! use h7s78_audio::{AudioInit, AudioSubsystem, SampleRate, Wm8904};
//!
//! // `scratch: &'static mut [i32]`, `buffer: &'static mut [u8]`
//! let mut audio = AudioSubsystem::new(board, Wm8904::new(i2c, delay), MyCallbacks, scratch);
//! audio.init_output(&AudioInit::output().with_sample_rate(SampleRate::Hz48000))?;
//! audio.play(buffer)?;
//!
//! // GPDMA1 channel interrupt for the serial-audio transmit path:
//! audio.out_irq_handler();
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `wm8904` | yes | WM8904 codec driver over `embedded-hal` I2C |
//! | `defmt` | no | `defmt` logging and `defmt::Format` on public types |
//!
//! ## Stream parameters
//!
//! - **Output:** headphone, 16- or 24-bit stereo, 8–96 kHz
//! - **Analog mic:** 16-bit, left channel duplicated to stereo, 8–96 kHz
//! - **Digital mic:** 16-bit mono, 8–192 kHz
//! - **Transfer size:** up to 65 535 bytes per buffer ([`constants::MAX_TRANSFER_BYTES`])

#![no_std]

#[macro_use]
mod fmt;

pub mod constants;
pub mod error;
pub mod config;
pub mod hw;
pub mod clock;
pub mod periph;
pub mod dma;
pub mod codec;
pub mod stream;
pub mod dispatch;
pub mod shared;

#[cfg(test)]
mod testing;

pub use codec::{AudioCodec, CodecProbe};
#[cfg(feature = "wm8904")]
pub use codec::Wm8904;
pub use config::{AudioInit, BitsPerSample, Device, InputDevice, InputInstance, OutputDevice, SampleRate};
pub use dispatch::{AudioCallbacks, AudioEvent, NoCallbacks};
pub use error::{Error, Result};
pub use hw::AudioHardware;
pub use shared::SharedAudio;
pub use stream::{AudioSubsystem, BufferError, StreamState};
