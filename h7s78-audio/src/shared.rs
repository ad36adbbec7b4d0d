//! Sharing one [`AudioSubsystem`] between thread mode and DMA interrupts.
//!
//! ```ignore
//! static AUDIO: SharedAudio<Board, Wm8904<I2c, Delay>, Callbacks> = SharedAudio::new();
//!
//! AUDIO.install(AudioSubsystem::new(board, codec, Callbacks, scratch));
//! AUDIO.with(|audio| audio.play(buffer)).transpose()?;
//!
//! #[interrupt]
//! fn GPDMA1_CH0() {
//!     AUDIO.on_interrupt(DmaChannel::SerialAudioTx);
//! }
//! ```
//!
//! Every access runs inside a critical section, so a completion callback
//! never observes a half-finished public operation.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::clock::DefaultClockConfig;
use crate::dispatch::AudioCallbacks;
use crate::hw::{DmaChannel, DmaController};
use crate::periph::DefaultPeripheralInit;
use crate::stream::AudioSubsystem;

/// A subsystem slot guarded by a critical section.
pub struct SharedAudio<H, C, CB, K = DefaultClockConfig, I = DefaultPeripheralInit> {
    inner: Mutex<RefCell<Option<AudioSubsystem<H, C, CB, K, I>>>>,
}

impl<H, C, CB, K, I> SharedAudio<H, C, CB, K, I> {
    /// An empty slot, usable in a `static`.
    pub const fn new() -> Self {
        SharedAudio {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Put `audio` in the slot, returning whatever was there.
    pub fn install(&self, audio: AudioSubsystem<H, C, CB, K, I>) -> Option<AudioSubsystem<H, C, CB, K, I>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(audio))
    }

    pub fn take(&self) -> Option<AudioSubsystem<H, C, CB, K, I>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Run `f` on the installed subsystem. `None` when the slot is empty.
    ///
    /// Must not be re-entered from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut AudioSubsystem<H, C, CB, K, I>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<H, C, CB, K, I> SharedAudio<H, C, CB, K, I>
where
    H: DmaController,
    CB: AudioCallbacks,
{
    /// Interrupt entry for `channel`. Returns `false` if nothing is installed.
    pub fn on_interrupt(&self, channel: DmaChannel) -> bool {
        let handled = self.with(|audio| audio.dma_irq_handler(channel)).is_some();
        if !handled {
            trace!("shared: {} interrupt with no subsystem", channel);
        }
        handled
    }
}

impl<H, C, CB, K, I> Default for SharedAudio<H, C, CB, K, I> {
    fn default() -> Self {
        Self::new()
    }
}
