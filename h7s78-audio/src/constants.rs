/// Largest buffer, in bytes, a single Play/Record call may arm.
///
/// The DMA block-size register holds 16 bits.
pub const MAX_TRANSFER_BYTES: usize = 65_535;

/// Capacity of the digital-mic scratch buffer in raw 32-bit filter words.
///
/// A digital-mic record of `n` bytes needs `n / 2` words of scratch.
pub const DIGITAL_MIC_SCRATCH_WORDS: usize = 2048;

/// Maximum number of descriptors one circular DMA chain can hold.
pub const DESCRIPTOR_QUEUE_CAPACITY: usize = 4;

/// Frequency of the base oscillator feeding both audio PLLs (HSI, 64 MHz).
pub const BASE_CLOCK_HZ: u32 = 64_000_000;

/// Upper bound on the PLL lock busy-wait during bring-up.
pub const PLL_LOCK_TIMEOUT_MS: u32 = 10;

/// Upper bound on the codec write-sequencer busy-wait during bring-up.
pub const CODEC_SEQUENCER_TIMEOUT_MS: u32 = 300;

/// 7-bit I2C address of the on-board WM8904 (0x34 in 8-bit notation).
pub const CODEC_I2C_ADDRESS: u8 = 0x1A;

/// Value read back from the WM8904 ID register.
pub const WM8904_ID: u32 = 0x8904;

/// Mask applied to the ID register before comparing with [`WM8904_ID`].
pub const WM8904_ID_MASK: u32 = 0xFFFF;
