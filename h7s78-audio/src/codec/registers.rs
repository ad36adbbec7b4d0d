//! WM8904 register addresses and bitfield definitions.
//!
//! Register addresses are 8-bit; every register holds a 16-bit value sent
//! big-endian on the I2C bus after the address byte.

// The full bitfield map is kept next to the addresses even where the driver
// only touches a single field.
#![allow(dead_code)]

// ── Identification / reset ────────────────────────────────────────────────

/// Software reset (write) and device ID (read, 0x8904).
pub const SW_RESET_AND_ID: u8 = 0x00;

// ── Bias and VMID ─────────────────────────────────────────────────────────

/// Bias control 0.
/// - Bit 3 — ISEL high-performance bias
/// - Bit 0 — BIAS_ENA
pub const BIAS_CONTROL_0: u8 = 0x04;

/// VMID control 0.
/// - Bit 6 — VMID_BUF_ENA
/// - Bits 2:1 — VMID_RES
/// - Bit 0 — VMID_ENA
pub const VMID_CONTROL_0: u8 = 0x05;

// ── Power management ──────────────────────────────────────────────────────

/// Power management 0.
/// - Bit 1 — INL_ENA
/// - Bit 0 — INR_ENA
pub const POWER_MANAGEMENT_0: u8 = 0x0C;
pub const PM0_INL_ENA: u16 = 1 << 1;
pub const PM0_INR_ENA: u16 = 1 << 0;

/// Power management 2.
/// - Bit 1 — HPL_PGA_ENA
/// - Bit 0 — HPR_PGA_ENA
pub const POWER_MANAGEMENT_2: u8 = 0x0E;
pub const PM2_HPL_PGA_ENA: u16 = 1 << 1;
pub const PM2_HPR_PGA_ENA: u16 = 1 << 0;

/// Power management 6.
/// - Bit 3 — DACL_ENA
/// - Bit 2 — DACR_ENA
/// - Bit 1 — ADCL_ENA
/// - Bit 0 — ADCR_ENA
pub const POWER_MANAGEMENT_6: u8 = 0x12;
pub const PM6_DACL_ENA: u16 = 1 << 3;
pub const PM6_DACR_ENA: u16 = 1 << 2;
pub const PM6_ADCL_ENA: u16 = 1 << 1;
pub const PM6_ADCR_ENA: u16 = 1 << 0;

// ── Clocking ──────────────────────────────────────────────────────────────

/// Clock rates 0.
/// - Bit 0 — MCLK_DIV
pub const CLOCK_RATES_0: u8 = 0x14;

/// Clock rates 1.
/// - Bits 13:10 — CLK_SYS_RATE (MCLK/fs ratio code)
/// - Bits 2:0 — SAMPLE_RATE (0 = 8k, 1 = 11.025k, 2 = 16k, 3 = 22.05k,
///   4 = 32k, 5 = 44.1k/48k and above)
pub const CLOCK_RATES_1: u8 = 0x15;
pub const CLK_SYS_RATE_SHIFT: u16 = 10;
/// CLK_SYS_RATE code for 256 × fs.
pub const CLK_SYS_RATE_256: u16 = 3;
/// CLK_SYS_RATE code for 128 × fs.
pub const CLK_SYS_RATE_128: u16 = 1;

/// Clock rates 2.
/// - Bit 14 — SYSCLK_SRC (0 = MCLK)
/// - Bit 2 — CLK_SYS_ENA
/// - Bit 1 — CLK_DSP_ENA
/// - Bit 0 — TOCLK_ENA
pub const CLOCK_RATES_2: u8 = 0x16;
pub const CLK_SYS_ENA: u16 = 1 << 2;
pub const CLK_DSP_ENA: u16 = 1 << 1;

// ── Audio interface ───────────────────────────────────────────────────────

/// Audio interface 0 (ADC/DAC channel swaps, companding).
pub const AUDIO_INTERFACE_0: u8 = 0x18;

/// Audio interface 1.
/// - Bits 3:2 — AIF_WL (0 = 16, 1 = 20, 2 = 24, 3 = 32 bit)
/// - Bits 1:0 — AIF_FMT (2 = I2S)
pub const AUDIO_INTERFACE_1: u8 = 0x19;
pub const AIF_WL_SHIFT: u16 = 2;
pub const AIF_WL_MASK: u16 = 0b11 << 2;
pub const AIF_FMT_I2S: u16 = 0b10;

// ── DAC ───────────────────────────────────────────────────────────────────

/// DAC digital volume left / right.
/// - Bit 8 — DAC_VU (latch both channels)
/// - Bits 7:0 — DAC vol (0xC0 = 0 dB)
pub const DAC_DIGITAL_VOLUME_LEFT: u8 = 0x1E;
pub const DAC_DIGITAL_VOLUME_RIGHT: u8 = 0x1F;

/// DAC digital 1.
/// - Bit 3 — DAC_MUTE (soft mute)
pub const DAC_DIGITAL_1: u8 = 0x21;
pub const DAC_MUTE: u16 = 1 << 3;

// ── ADC / analogue inputs ─────────────────────────────────────────────────

/// ADC digital volume left / right.
/// - Bit 8 — ADC_VU
/// - Bits 7:0 — ADC vol (0xC0 = 0 dB)
pub const ADC_DIGITAL_VOLUME_LEFT: u8 = 0x24;
pub const ADC_DIGITAL_VOLUME_RIGHT: u8 = 0x25;

/// Analogue left / right input 0.
/// - Bit 7 — LINMUTE / RINMUTE
/// - Bits 4:0 — LIN_VOL / RIN_VOL (PGA gain, 31 = +28.5 dB)
pub const ANALOGUE_LEFT_INPUT_0: u8 = 0x2C;
pub const ANALOGUE_RIGHT_INPUT_0: u8 = 0x2D;
pub const INPUT_PGA_MUTE: u16 = 1 << 7;
pub const INPUT_PGA_VOL_MASK: u16 = 0x1F;
/// Largest input PGA code.
pub const INPUT_PGA_VOL_MAX: u16 = 31;

/// Analogue left / right input 1 (input mux and mode).
/// - Bits 5:4 — IP_SEL_N
/// - Bits 3:2 — IP_SEL_P
/// - Bits 1:0 — MODE (0 = single-ended)
pub const ANALOGUE_LEFT_INPUT_1: u8 = 0x2E;
pub const ANALOGUE_RIGHT_INPUT_1: u8 = 0x2F;

// ── Headphone output ──────────────────────────────────────────────────────

/// Analogue OUT1 left / right (headphone PGA).
/// - Bit 8 — HPOUTL_MUTE / HPOUTR_MUTE
/// - Bit 7 — HPOUT_VU (latch both channels)
/// - Bit 6 — zero-cross enable
/// - Bits 5:0 — HPOUT_VOL (63 = +6 dB)
pub const ANALOGUE_OUT1_LEFT: u8 = 0x39;
pub const ANALOGUE_OUT1_RIGHT: u8 = 0x3A;
pub const HPOUT_MUTE: u16 = 1 << 8;
pub const HPOUT_VU: u16 = 1 << 7;
pub const HPOUT_ZC: u16 = 1 << 6;
pub const HPOUT_VOL_MASK: u16 = 0x3F;
/// Largest headphone PGA code.
pub const HPOUT_VOL_MAX: u16 = 63;

/// Analogue HP 0 (headphone output stage).
/// - Bits 7:4 — left RMV_SHORT / ENA_OUTP / ENA_DLY / ENA
/// - Bits 3:0 — right, same layout
pub const ANALOGUE_HP_0: u8 = 0x5A;
pub const HP_STAGE_ALL_ON: u16 = 0x00FF;

// ── Charge pump / class W ─────────────────────────────────────────────────

/// Charge pump 0.
/// - Bit 0 — CP_ENA
pub const CHARGE_PUMP_0: u8 = 0x62;
pub const CP_ENA: u16 = 1 << 0;

/// Class W 0.
/// - Bit 0 — CP_DYN_PWR
pub const CLASS_W_0: u8 = 0x68;

// ── Write sequencer ───────────────────────────────────────────────────────

/// Write sequencer 0.
/// - Bit 8 — WSEQ_ENA
pub const WRITE_SEQUENCER_0: u8 = 0x6C;
pub const WSEQ_ENA: u16 = 1 << 8;

/// Write sequencer 3.
/// - Bit 9 — WSEQ_ABORT
/// - Bit 8 — WSEQ_START
/// - Bits 5:0 — WSEQ_START_INDEX
pub const WRITE_SEQUENCER_3: u8 = 0x6F;
pub const WSEQ_ABORT: u16 = 1 << 9;
pub const WSEQ_START: u16 = 1 << 8;

/// Write sequencer 4.
/// - Bits 9:4 — WSEQ_CURRENT_INDEX
/// - Bit 0 — WSEQ_BUSY
pub const WRITE_SEQUENCER_4: u8 = 0x70;
pub const WSEQ_BUSY: u16 = 1 << 0;

/// Start index of the built-in start-up sequence.
pub const WSEQ_STARTUP_INDEX: u16 = 0x00;
/// Start index of the built-in shut-down sequence.
pub const WSEQ_SHUTDOWN_INDEX: u16 = 0x18;
