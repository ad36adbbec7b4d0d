//! WM8904 audio codec driver.
//!
//! Minimal driver for the WM8904 on the STM32H7S78-DK: headphone playback
//! through the DAC, or analog-microphone capture through the ADC, in I2S
//! slave mode clocked from the MCU's master clock.
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] and
//! [`embedded_hal::delay::DelayNs`] implementation. The delay is used only
//! while polling the on-chip write sequencer during power-up and power-down.
//!
//! # Example
//!
//! ```ignore
//! let mut codec = Wm8904::new(i2c, delay);
//! codec.init(&CodecInit {
//!     path: CodecPath::Headphone,
//!     sample_rate: SampleRate::Hz48000,
//!     bits_per_sample: BitsPerSample::Bits16,
//!     volume: 50,
//! })?;
//! codec.play()?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::registers as reg;
use super::{AudioCodec, CodecInit, CodecPath, CodecProbe, VolumeTarget};
use crate::config::{BitsPerSample, SampleRate};
use crate::constants::{CODEC_I2C_ADDRESS, CODEC_SEQUENCER_TIMEOUT_MS};

// ── Errors ─────────────────────────────────────────────────────────────────

/// WM8904 driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wm8904Error<E> {
    /// The I2C transaction failed.
    I2c(E),
    /// The write sequencer was still busy after the bring-up timeout.
    SequencerTimeout,
    /// The sample rate is above what the codec clocking supports.
    UnsupportedRate,
    /// The word length cannot be carried on the audio interface.
    UnsupportedFormat,
}

// ── Driver struct ──────────────────────────────────────────────────────────

/// WM8904 audio codec driver.
pub struct Wm8904<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    /// Path selected by the last successful init.
    path: Option<CodecPath>,
    /// User mute, kept across transport commands.
    muted: bool,
}

type Result<T, E> = core::result::Result<T, Wm8904Error<E>>;

impl<I2C, D> Wm8904<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Default 7-bit address of the discovery kit's codec.
    pub const DEFAULT_ADDRESS: u8 = CODEC_I2C_ADDRESS;

    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::new_with_address(i2c, delay, Self::DEFAULT_ADDRESS)
    }

    pub fn new_with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            path: None,
            muted: false,
        }
    }

    /// Path configured by the last init, `None` when powered down.
    pub fn path(&self) -> Option<CodecPath> {
        self.path
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    // ── Low-level I2C helpers ──────────────────────────────────────────

    /// Write a 16-bit value to an 8-bit register.
    pub fn write_register(&mut self, register: u8, value: u16) -> Result<(), I2C::Error> {
        let buf = [register, (value >> 8) as u8, value as u8];
        self.i2c.write(self.address, &buf).map_err(Wm8904Error::I2c)
    }

    /// Read a 16-bit value from an 8-bit register.
    pub fn read_register(&mut self, register: u8) -> Result<u16, I2C::Error> {
        let mut val_buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut val_buf)
            .map_err(Wm8904Error::I2c)?;
        Ok(u16::from_be_bytes(val_buf))
    }

    /// Read-modify-write: `new = (current & !mask) | value`.
    fn modify(&mut self, register: u8, value: u16, mask: u16) -> Result<u16, I2C::Error> {
        let current = self.read_register(register)?;
        let new_val = (current & !mask) | value;
        self.write_register(register, new_val)?;
        Ok(new_val)
    }

    // ── Write sequencer ────────────────────────────────────────────────

    /// Run a built-in write-sequencer program and wait for it to finish.
    ///
    /// Polls `WSEQ_BUSY` once per millisecond for at most
    /// [`CODEC_SEQUENCER_TIMEOUT_MS`].
    fn run_sequence(&mut self, start_index: u16) -> Result<(), I2C::Error> {
        self.write_register(reg::WRITE_SEQUENCER_0, reg::WSEQ_ENA)?;
        self.write_register(reg::WRITE_SEQUENCER_3, reg::WSEQ_START | start_index)?;

        let mut waited_ms = 0;
        while self.read_register(reg::WRITE_SEQUENCER_4)? & reg::WSEQ_BUSY != 0 {
            if waited_ms >= CODEC_SEQUENCER_TIMEOUT_MS {
                self.write_register(reg::WRITE_SEQUENCER_3, reg::WSEQ_ABORT)?;
                return Err(Wm8904Error::SequencerTimeout);
            }
            self.delay.delay_ms(1);
            waited_ms += 1;
        }
        Ok(())
    }

    // ── Clocking and format ────────────────────────────────────────────

    /// `(CLK_SYS_RATE, SAMPLE_RATE)` codes for `rate` with MCLK = 256 fs
    /// (128 fs above 48 kHz).
    fn rate_codes(rate: SampleRate) -> Option<(u16, u16)> {
        use SampleRate::*;
        let codes = match rate {
            Hz8000 => (reg::CLK_SYS_RATE_256, 0),
            Hz11025 => (reg::CLK_SYS_RATE_256, 1),
            Hz16000 => (reg::CLK_SYS_RATE_256, 2),
            Hz22050 => (reg::CLK_SYS_RATE_256, 3),
            Hz32000 => (reg::CLK_SYS_RATE_256, 4),
            Hz44100 | Hz48000 => (reg::CLK_SYS_RATE_256, 5),
            Hz88200 | Hz96000 => (reg::CLK_SYS_RATE_128, 5),
            Hz176400 | Hz192000 => return None,
        };
        Some(codes)
    }

    fn word_length_code(bits: BitsPerSample) -> Option<u16> {
        match bits {
            BitsPerSample::Bits16 => Some(0),
            BitsPerSample::Bits24 => Some(2),
            BitsPerSample::Bits32 => Some(3),
            BitsPerSample::Bits8 => None,
        }
    }

    // ── Power-up ───────────────────────────────────────────────────────

    /// Start-up sequence, clocks, interface format, then the selected path.
    ///
    /// Rate and format are validated before anything is written.
    pub fn power_up(&mut self, config: &CodecInit) -> Result<(), I2C::Error> {
        let (sys, fs) = Self::rate_codes(config.sample_rate).ok_or(Wm8904Error::UnsupportedRate)?;
        let wl = Self::word_length_code(config.bits_per_sample).ok_or(Wm8904Error::UnsupportedFormat)?;

        self.run_sequence(reg::WSEQ_STARTUP_INDEX)?;

        // MCLK undivided, system clock from MCLK
        self.write_register(reg::CLOCK_RATES_0, 0x0000)?;
        self.write_register(reg::CLOCK_RATES_1, (sys << reg::CLK_SYS_RATE_SHIFT) | fs)?;
        self.write_register(reg::CLOCK_RATES_2, reg::CLK_SYS_ENA | reg::CLK_DSP_ENA)?;
        self.write_register(reg::AUDIO_INTERFACE_1, (wl << reg::AIF_WL_SHIFT) | reg::AIF_FMT_I2S)?;

        match config.path {
            CodecPath::Headphone => {
                self.write_register(reg::POWER_MANAGEMENT_6, reg::PM6_DACL_ENA | reg::PM6_DACR_ENA)?;
                self.write_register(
                    reg::POWER_MANAGEMENT_2,
                    reg::PM2_HPL_PGA_ENA | reg::PM2_HPR_PGA_ENA,
                )?;
                self.write_register(reg::CHARGE_PUMP_0, reg::CP_ENA)?;
                // Dynamic charge-pump power
                self.write_register(reg::CLASS_W_0, 0x0001)?;
                self.write_register(reg::ANALOGUE_HP_0, reg::HP_STAGE_ALL_ON)?;
                // Soft-muted until play
                self.write_register(reg::DAC_DIGITAL_1, reg::DAC_MUTE)?;
            }
            CodecPath::AnalogMic => {
                self.write_register(reg::POWER_MANAGEMENT_0, reg::PM0_INL_ENA | reg::PM0_INR_ENA)?;
                self.write_register(reg::POWER_MANAGEMENT_6, reg::PM6_ADCL_ENA | reg::PM6_ADCR_ENA)?;
                // IN1L / IN1R, single-ended
                self.write_register(reg::ANALOGUE_LEFT_INPUT_1, 0x0000)?;
                self.write_register(reg::ANALOGUE_RIGHT_INPUT_1, 0x0000)?;
            }
        }
        self.path = Some(config.path);
        self.muted = false;

        match config.path {
            CodecPath::Headphone => self.headphone_volume(config.volume),
            CodecPath::AnalogMic => self.input_volume(config.volume),
        }
    }

    /// Shut-down sequence. The path is forgotten even if the sequencer
    /// times out.
    pub fn power_down(&mut self) -> Result<(), I2C::Error> {
        self.path = None;
        self.run_sequence(reg::WSEQ_SHUTDOWN_INDEX)
    }

    // ── Volume ─────────────────────────────────────────────────────────

    /// Headphone PGA, 0–100 % mapped onto 0–63.
    pub fn headphone_volume(&mut self, percent: u8) -> Result<(), I2C::Error> {
        let code = Self::scale(percent, reg::HPOUT_VOL_MAX);
        let mute = if self.muted { reg::HPOUT_MUTE } else { 0 };
        let val = code | reg::HPOUT_ZC | mute;
        self.write_register(reg::ANALOGUE_OUT1_LEFT, val)?;
        // VU on the second write latches both channels together
        self.write_register(reg::ANALOGUE_OUT1_RIGHT, val | reg::HPOUT_VU)
    }

    /// Input PGA, 0–100 % mapped onto 0–31.
    pub fn input_volume(&mut self, percent: u8) -> Result<(), I2C::Error> {
        let code = Self::scale(percent, reg::INPUT_PGA_VOL_MAX);
        let mute = if self.muted { reg::INPUT_PGA_MUTE } else { 0 };
        self.write_register(reg::ANALOGUE_LEFT_INPUT_0, code | mute)?;
        self.write_register(reg::ANALOGUE_RIGHT_INPUT_0, code | mute)
    }

    // ── Mute ───────────────────────────────────────────────────────────

    /// DAC soft mute, used for transport control.
    fn dac_soft_mute(&mut self, mute: bool) -> Result<(), I2C::Error> {
        let value = if mute { reg::DAC_MUTE } else { 0 };
        self.modify(reg::DAC_DIGITAL_1, value, reg::DAC_MUTE)?;
        Ok(())
    }

    /// User mute on the active path's analogue stage.
    pub fn mute(&mut self, mute: bool) -> Result<(), I2C::Error> {
        self.muted = mute;
        match self.path {
            Some(CodecPath::Headphone) => {
                let value = if mute { reg::HPOUT_MUTE } else { 0 };
                self.modify(reg::ANALOGUE_OUT1_LEFT, value, reg::HPOUT_MUTE)?;
                self.modify(
                    reg::ANALOGUE_OUT1_RIGHT,
                    value | reg::HPOUT_VU,
                    reg::HPOUT_MUTE | reg::HPOUT_VU,
                )?;
            }
            Some(CodecPath::AnalogMic) => {
                let value = if mute { reg::INPUT_PGA_MUTE } else { 0 };
                self.modify(reg::ANALOGUE_LEFT_INPUT_0, value, reg::INPUT_PGA_MUTE)?;
                self.modify(reg::ANALOGUE_RIGHT_INPUT_0, value, reg::INPUT_PGA_MUTE)?;
            }
            None => {}
        }
        Ok(())
    }

    // ── Release ────────────────────────────────────────────────────────

    /// Consume the driver and return the I2C bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    // ── Private helpers ────────────────────────────────────────────────

    /// `percent * max / 100`, clamped at 100 %.
    fn scale(percent: u8, max: u16) -> u16 {
        (percent.min(100) as u16 * max) / 100
    }
}

// ── Capability trait implementations ───────────────────────────────────────

impl<I2C, D> AudioCodec for Wm8904<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Wm8904Error<I2C::Error>;

    fn init(&mut self, config: &CodecInit) -> core::result::Result<(), Self::Error> {
        self.power_up(config)
    }

    fn deinit(&mut self) -> core::result::Result<(), Self::Error> {
        self.power_down()
    }

    fn play(&mut self) -> core::result::Result<(), Self::Error> {
        self.dac_soft_mute(false)
    }

    fn pause(&mut self) -> core::result::Result<(), Self::Error> {
        self.dac_soft_mute(true)
    }

    fn resume(&mut self) -> core::result::Result<(), Self::Error> {
        self.dac_soft_mute(false)
    }

    fn stop(&mut self) -> core::result::Result<(), Self::Error> {
        self.dac_soft_mute(true)
    }

    fn set_mute(&mut self, mute: bool) -> core::result::Result<(), Self::Error> {
        self.mute(mute)
    }

    fn set_volume(&mut self, target: VolumeTarget, percent: u8) -> core::result::Result<(), Self::Error> {
        match target {
            VolumeTarget::Output => self.headphone_volume(percent),
            VolumeTarget::Input => self.input_volume(percent),
        }
    }
}

impl<I2C, D> CodecProbe for Wm8904<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Wm8904Error<I2C::Error>;

    fn read_id(&mut self) -> core::result::Result<u32, Self::Error> {
        self.read_register(reg::SW_RESET_AND_ID).map(u32::from)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecBinding;
    use embedded_hal::delay::DelayNs;
    use embedded_hal::i2c::{self, ErrorType, I2c, Operation};

    // ── Mock I2C with register file ───────────────────────────────────

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockError;

    impl i2c::Error for MockError {
        fn kind(&self) -> i2c::ErrorKind {
            i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
        }
    }

    /// Mock I2C that maintains a register file and records writes.
    struct MockI2c {
        regs: [u16; 256],
        /// Write log in chronological order.
        log: [(u8, u16); 128],
        log_count: usize,
        /// Reads of WSEQ_BUSY that still report busy.
        busy_polls: u32,
        /// NACK every transaction.
        fail: bool,
    }

    impl MockI2c {
        fn new() -> Self {
            let mut regs = [0; 256];
            regs[reg::SW_RESET_AND_ID as usize] = 0x8904;
            Self {
                regs,
                log: [(0, 0); 128],
                log_count: 0,
                busy_polls: 0,
                fail: false,
            }
        }

        fn read_reg(&self, addr: u8) -> u16 {
            self.regs[addr as usize]
        }

        fn write_at(&self, idx: usize) -> (u8, u16) {
            self.log[idx]
        }

        fn writes_to(&self, addr: u8) -> usize {
            self.log[..self.log_count].iter().filter(|(r, _)| *r == addr).count()
        }
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        fn read(&mut self, _addr: u8, _buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
            Ok(())
        }

        fn write(&mut self, _addr: u8, bytes: &[u8]) -> core::result::Result<(), Self::Error> {
            if self.fail {
                return Err(MockError);
            }
            if bytes.len() == 3 {
                let val = ((bytes[1] as u16) << 8) | bytes[2] as u16;
                self.regs[bytes[0] as usize] = val;
                self.log[self.log_count] = (bytes[0], val);
                self.log_count += 1;
            }
            Ok(())
        }

        fn write_read(
            &mut self,
            _addr: u8,
            wr: &[u8],
            rd: &mut [u8],
        ) -> core::result::Result<(), Self::Error> {
            if self.fail {
                return Err(MockError);
            }
            if wr.len() == 1 && rd.len() >= 2 {
                let mut val = self.read_reg(wr[0]);
                if wr[0] == reg::WRITE_SEQUENCER_4 && self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    val |= reg::WSEQ_BUSY;
                }
                rd[0] = (val >> 8) as u8;
                rd[1] = val as u8;
            }
            Ok(())
        }

        fn transaction(
            &mut self,
            _addr: u8,
            _ops: &mut [Operation<'_>],
        ) -> core::result::Result<(), Self::Error> {
            Ok(())
        }
    }

    // ── Mock delay (counts milliseconds) ──────────────────────────────

    struct MockDelay {
        ms: u32,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.ms += ms;
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn make_codec() -> Wm8904<MockI2c, MockDelay> {
        Wm8904::new(MockI2c::new(), MockDelay { ms: 0 })
    }

    fn headphone(rate: SampleRate) -> CodecInit {
        CodecInit {
            path: CodecPath::Headphone,
            sample_rate: rate,
            bits_per_sample: BitsPerSample::Bits16,
            volume: 50,
        }
    }

    fn mic() -> CodecInit {
        CodecInit {
            path: CodecPath::AnalogMic,
            sample_rate: SampleRate::Hz16000,
            bits_per_sample: BitsPerSample::Bits16,
            volume: 100,
        }
    }

    // ── Probe tests ───────────────────────────────────────────────────

    #[test]
    fn reads_chip_id() {
        let mut codec = make_codec();
        assert_eq!(codec.read_id(), Ok(0x8904));
    }

    #[test]
    fn binds_through_probe() {
        let mut binding = CodecBinding::new(make_codec());
        assert!(binding.bind().is_ok());
    }

    #[test]
    fn probe_reports_bus_error() {
        let mut i2c = MockI2c::new();
        i2c.fail = true;
        let mut codec = Wm8904::new(i2c, MockDelay { ms: 0 });
        assert_eq!(codec.read_id(), Err(Wm8904Error::I2c(MockError)));
    }

    // ── Power-up tests ────────────────────────────────────────────────

    #[test]
    fn headphone_init_runs_startup_sequence_first() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();
        let (i2c, _) = codec.release();

        assert_eq!(i2c.write_at(0), (reg::WRITE_SEQUENCER_0, reg::WSEQ_ENA));
        assert_eq!(i2c.write_at(1), (reg::WRITE_SEQUENCER_3, reg::WSEQ_START));
        // 256 fs, 48 kHz
        assert_eq!(i2c.read_reg(reg::CLOCK_RATES_1), (3 << 10) | 5);
        assert_eq!(i2c.read_reg(reg::AUDIO_INTERFACE_1), reg::AIF_FMT_I2S);
        assert_eq!(
            i2c.read_reg(reg::POWER_MANAGEMENT_6),
            reg::PM6_DACL_ENA | reg::PM6_DACR_ENA
        );
        assert_eq!(i2c.read_reg(reg::DAC_DIGITAL_1), reg::DAC_MUTE);
    }

    #[test]
    fn init_applies_volume() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz8000)).unwrap();
        let (i2c, _) = codec.release();
        // 50 % of 63 = 31
        assert_eq!(i2c.read_reg(reg::ANALOGUE_OUT1_LEFT) & reg::HPOUT_VOL_MASK, 31);
        assert_ne!(i2c.read_reg(reg::ANALOGUE_OUT1_RIGHT) & reg::HPOUT_VU, 0);
    }

    #[test]
    fn mic_init_powers_adc_and_sets_pga() {
        let mut codec = make_codec();
        codec.init(&mic()).unwrap();
        assert_eq!(codec.path(), Some(CodecPath::AnalogMic));
        let (i2c, _) = codec.release();

        assert_eq!(
            i2c.read_reg(reg::POWER_MANAGEMENT_6),
            reg::PM6_ADCL_ENA | reg::PM6_ADCR_ENA
        );
        assert_eq!(i2c.read_reg(reg::ANALOGUE_LEFT_INPUT_0), 31);
        assert_eq!(i2c.read_reg(reg::CLOCK_RATES_1) & 0x7, 2);
        assert_eq!(i2c.writes_to(reg::ANALOGUE_OUT1_LEFT), 0);
    }

    #[test]
    fn high_rates_switch_to_128fs() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz96000)).unwrap();
        let (i2c, _) = codec.release();
        assert_eq!(i2c.read_reg(reg::CLOCK_RATES_1), (1 << 10) | 5);
    }

    #[test]
    fn rejects_rates_above_96k_before_writing() {
        let mut codec = make_codec();
        assert_eq!(
            codec.init(&headphone(SampleRate::Hz192000)),
            Err(Wm8904Error::UnsupportedRate)
        );
        let (i2c, _) = codec.release();
        assert_eq!(i2c.log_count, 0);
    }

    #[test]
    fn word_length_24_bit() {
        let mut codec = make_codec();
        let mut cfg = headphone(SampleRate::Hz48000);
        cfg.bits_per_sample = BitsPerSample::Bits24;
        codec.init(&cfg).unwrap();
        let (i2c, _) = codec.release();
        assert_eq!(i2c.read_reg(reg::AUDIO_INTERFACE_1), (2 << 2) | reg::AIF_FMT_I2S);
    }

    // ── Write sequencer tests ─────────────────────────────────────────

    #[test]
    fn waits_for_sequencer() {
        let mut i2c = MockI2c::new();
        i2c.busy_polls = 5;
        let mut codec = Wm8904::new(i2c, MockDelay { ms: 0 });
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();
        let (_, delay) = codec.release();
        assert_eq!(delay.ms, 5);
    }

    #[test]
    fn sequencer_wait_is_bounded() {
        let mut i2c = MockI2c::new();
        i2c.busy_polls = u32::MAX;
        let mut codec = Wm8904::new(i2c, MockDelay { ms: 0 });
        assert_eq!(
            codec.init(&headphone(SampleRate::Hz48000)),
            Err(Wm8904Error::SequencerTimeout)
        );
        assert_eq!(codec.path(), None);
        let (i2c, delay) = codec.release();
        assert_eq!(delay.ms, CODEC_SEQUENCER_TIMEOUT_MS);
        assert_eq!(i2c.read_reg(reg::WRITE_SEQUENCER_3), reg::WSEQ_ABORT);
    }

    #[test]
    fn deinit_runs_shutdown_sequence() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();
        codec.deinit().unwrap();
        assert_eq!(codec.path(), None);
        let (i2c, _) = codec.release();
        assert_eq!(
            i2c.read_reg(reg::WRITE_SEQUENCER_3),
            reg::WSEQ_START | reg::WSEQ_SHUTDOWN_INDEX
        );
    }

    // ── Transport tests ───────────────────────────────────────────────

    #[test]
    fn play_pause_resume_stop_toggle_dac_mute() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();

        codec.play().unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAC_DIGITAL_1) & reg::DAC_MUTE, 0);
        codec.pause().unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAC_DIGITAL_1) & reg::DAC_MUTE, reg::DAC_MUTE);
        codec.resume().unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAC_DIGITAL_1) & reg::DAC_MUTE, 0);
        codec.stop().unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAC_DIGITAL_1) & reg::DAC_MUTE, reg::DAC_MUTE);
    }

    // ── Volume / mute tests ───────────────────────────────────────────

    #[test]
    fn volume_scaling() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();

        codec.set_volume(VolumeTarget::Output, 100).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::ANALOGUE_OUT1_LEFT) & reg::HPOUT_VOL_MASK, 63);
        codec.set_volume(VolumeTarget::Output, 0).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::ANALOGUE_OUT1_LEFT) & reg::HPOUT_VOL_MASK, 0);
        codec.set_volume(VolumeTarget::Input, 50).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::ANALOGUE_LEFT_INPUT_0), 15);
    }

    #[test]
    fn volume_clamps_above_100() {
        assert_eq!(Wm8904::<MockI2c, MockDelay>::scale(250, reg::HPOUT_VOL_MAX), 63);
    }

    #[test]
    fn mute_survives_volume_change() {
        let mut codec = make_codec();
        codec.init(&headphone(SampleRate::Hz48000)).unwrap();
        codec.set_mute(true).unwrap();
        assert!(codec.is_muted());
        codec.set_volume(VolumeTarget::Output, 80).unwrap();
        assert_ne!(codec.i2c.read_reg(reg::ANALOGUE_OUT1_LEFT) & reg::HPOUT_MUTE, 0);

        codec.set_mute(false).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::ANALOGUE_OUT1_LEFT) & reg::HPOUT_MUTE, 0);
        assert_eq!(codec.i2c.read_reg(reg::ANALOGUE_OUT1_RIGHT) & reg::HPOUT_MUTE, 0);
    }

    #[test]
    fn mic_mute_uses_input_pga() {
        let mut codec = make_codec();
        codec.init(&mic()).unwrap();
        codec.set_mute(true).unwrap();
        assert_ne!(codec.i2c.read_reg(reg::ANALOGUE_RIGHT_INPUT_0) & reg::INPUT_PGA_MUTE, 0);
    }

    // ── Address / release tests ───────────────────────────────────────

    #[test]
    fn custom_address() {
        let codec = Wm8904::new_with_address(MockI2c::new(), MockDelay { ms: 0 }, 0x1B);
        assert_eq!(codec.address, 0x1B);
        let codec = make_codec();
        assert_eq!(codec.address, Wm8904::<MockI2c, MockDelay>::DEFAULT_ADDRESS);
    }
}
