//! Host-side doubles for the hardware, the codec and the callbacks.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::clock::PllSettings;
use crate::codec::{AudioCodec, CodecInit, CodecProbe, VolumeTarget};
use crate::config::InputInstance;
use crate::constants::{DIGITAL_MIC_SCRATCH_WORDS, WM8904_ID};
use crate::dispatch::AudioCallbacks;
use crate::dma::{DataWidth, DescriptorQueue};
use crate::hw::{
    ClockTree, Direction, DmaChannel, DmaController, HwError, KernelClock, MicFilterPort, Pll,
    SerialAudioConfig, SerialAudioPort, TransferEvent,
};
use crate::periph::MicFilterConfig;
use crate::stream::AudioSubsystem;

/// A zeroed buffer that lives for the rest of the test run.
pub fn leak_buffer(len: usize) -> &'static mut [u8] {
    std::vec![0u8; len].leak()
}

pub fn leak_scratch(words: usize) -> &'static mut [i32] {
    std::vec![0i32; words].leak()
}

pub type TestSubsystem = AudioSubsystem<MockHardware, MockCodec, RecordingCallbacks>;

/// Subsystem over fresh mocks with a full-size scratch buffer.
pub fn subsystem() -> TestSubsystem {
    AudioSubsystem::new(
        MockHardware::new(),
        MockCodec::new(),
        RecordingCallbacks::default(),
        leak_scratch(DIGITAL_MIC_SCRATCH_WORDS),
    )
}

// ── Hardware ────────────────────────────────────────────────────────

/// Steps that can be made to fail.
#[derive(Debug, Default)]
pub struct Faults {
    pub pll: bool,
    pub kernel_clock: bool,
    pub dma_link: bool,
    pub dma_unlink: bool,
    pub dma_update: bool,
    pub serial_init: bool,
    pub serial_deinit: bool,
    pub serial_start: bool,
    pub serial_pause: bool,
    pub serial_stop: bool,
    pub mic_init: bool,
    pub mic_start: bool,
}

fn fail_if(flag: bool) -> Result<(), HwError> {
    if flag {
        Err(HwError::Fault)
    } else {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SerialTransfer {
    /// Buffer address and unit count of the last start.
    started: Option<(usize, u16)>,
    paused: bool,
    stopped: bool,
}

#[derive(Debug)]
pub struct MockHardware {
    pub base_clock_running: bool,
    /// Milliseconds of delay after enable before a PLL reports lock;
    /// `None` never locks.
    pub pll_lock_delay_ms: Option<u32>,
    pub delayed_ms: u32,
    pub pll_enable_count: u32,
    pub kernel_clock: Option<KernelClock>,
    /// Settings and the `delayed_ms` value at enable, per PLL.
    plls: [Option<(PllSettings, u32)>; 2],

    pub serial_audio_config: Option<SerialAudioConfig>,
    pub serial_msp_active: bool,
    pub serial_msp_inits: u32,
    pub serial_deinits: u32,
    serial: [SerialTransfer; 2],

    pub mic_filter_config: Option<MicFilterConfig>,
    pub mic_filter_deinits: u32,
    pub mic_msp_active: bool,
    acquisition: Option<(usize, u32)>,
    pub acquisition_starts: u32,
    pub acquisition_stops: u32,

    linked: [bool; 3],
    irq_enabled: [bool; 3],
    pub dma_link_count: u32,
    pub dma_head_updates: u32,
    /// Head width the controller was last given, per channel.
    widths: [Option<DataWidth>; 3],
    events: [VecDeque<TransferEvent>; 3],

    pub faults: Faults,
}

impl MockHardware {
    pub fn new() -> Self {
        MockHardware {
            base_clock_running: true,
            pll_lock_delay_ms: Some(0),
            delayed_ms: 0,
            pll_enable_count: 0,
            kernel_clock: None,
            plls: [None; 2],
            serial_audio_config: None,
            serial_msp_active: false,
            serial_msp_inits: 0,
            serial_deinits: 0,
            serial: [SerialTransfer::default(); 2],
            mic_filter_config: None,
            mic_filter_deinits: 0,
            mic_msp_active: false,
            acquisition: None,
            acquisition_starts: 0,
            acquisition_stops: 0,
            linked: [false; 3],
            irq_enabled: [false; 3],
            dma_link_count: 0,
            dma_head_updates: 0,
            widths: [None; 3],
            events: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            faults: Faults::default(),
        }
    }

    pub fn pll_config(&self, pll: Pll) -> Option<PllSettings> {
        self.plls[pll_index(pll)].map(|(settings, _)| settings)
    }

    pub fn dma_linked(&self, channel: DmaChannel) -> bool {
        self.linked[channel.index()]
    }

    pub fn dma_width(&self, channel: DmaChannel) -> Option<DataWidth> {
        self.widths[channel.index()]
    }

    pub fn dma_irq_enabled(&self, channel: DmaChannel) -> bool {
        self.irq_enabled[channel.index()]
    }

    /// Address and unit count of the last serial-audio start in `direction`.
    pub fn last_start(&self, direction: Direction) -> Option<(usize, u16)> {
        self.serial[direction_index(direction)].started
    }

    pub fn serial_stopped(&self, direction: Direction) -> bool {
        self.serial[direction_index(direction)].stopped
    }

    pub fn serial_paused(&self, direction: Direction) -> bool {
        self.serial[direction_index(direction)].paused
    }

    /// Length in bytes of the running acquisition.
    pub fn acquisition_bytes(&self) -> Option<u32> {
        self.acquisition.map(|(_, bytes)| bytes)
    }

    /// Latch `event` on `channel` for the next interrupt.
    pub fn push_event(&mut self, channel: DmaChannel, event: TransferEvent) {
        self.events[channel.index()].push_back(event);
    }

    pub fn pending_events(&self, channel: DmaChannel) -> usize {
        self.events[channel.index()].len()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

fn pll_index(pll: Pll) -> usize {
    match pll {
        Pll::Pll2 => 0,
        Pll::Pll3 => 1,
    }
}

fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::Transmit => 0,
        Direction::Receive => 1,
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.delayed_ms += ms;
    }
}

impl ClockTree for MockHardware {
    fn base_clock_ready(&self) -> bool {
        self.base_clock_running
    }

    fn enable_pll(&mut self, pll: Pll, settings: &PllSettings) -> Result<(), HwError> {
        fail_if(self.faults.pll)?;
        self.plls[pll_index(pll)] = Some((*settings, self.delayed_ms));
        self.pll_enable_count += 1;
        Ok(())
    }

    fn pll_locked(&self, pll: Pll) -> bool {
        match (self.plls[pll_index(pll)], self.pll_lock_delay_ms) {
            (Some((_, enabled_at)), Some(delay)) => self.delayed_ms - enabled_at >= delay,
            _ => false,
        }
    }

    fn select_kernel_clock(&mut self, selection: KernelClock) -> Result<(), HwError> {
        fail_if(self.faults.kernel_clock)?;
        self.kernel_clock = Some(selection);
        Ok(())
    }
}

impl SerialAudioPort for MockHardware {
    fn msp_init(&mut self) {
        self.serial_msp_active = true;
        self.serial_msp_inits += 1;
    }

    fn msp_deinit(&mut self) {
        self.serial_msp_active = false;
    }

    fn init(&mut self, config: &SerialAudioConfig) -> Result<(), HwError> {
        fail_if(self.faults.serial_init)?;
        self.serial_audio_config = Some(*config);
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), HwError> {
        fail_if(self.faults.serial_deinit)?;
        self.serial_audio_config = None;
        self.serial_deinits += 1;
        Ok(())
    }

    fn start(&mut self, direction: Direction, buffer: *mut u8, units: u16) -> Result<(), HwError> {
        fail_if(self.faults.serial_start)?;
        self.serial[direction_index(direction)] = SerialTransfer {
            started: Some((buffer as usize, units)),
            paused: false,
            stopped: false,
        };
        Ok(())
    }

    fn pause(&mut self, direction: Direction) -> Result<(), HwError> {
        fail_if(self.faults.serial_pause)?;
        self.serial[direction_index(direction)].paused = true;
        Ok(())
    }

    fn resume(&mut self, direction: Direction) -> Result<(), HwError> {
        self.serial[direction_index(direction)].paused = false;
        Ok(())
    }

    fn stop(&mut self, direction: Direction) -> Result<(), HwError> {
        fail_if(self.faults.serial_stop)?;
        self.serial[direction_index(direction)].stopped = true;
        Ok(())
    }
}

impl MicFilterPort for MockHardware {
    fn msp_init(&mut self) {
        self.mic_msp_active = true;
    }

    fn msp_deinit(&mut self) {
        self.mic_msp_active = false;
    }

    fn init(&mut self, config: &MicFilterConfig) -> Result<(), HwError> {
        fail_if(self.faults.mic_init)?;
        self.mic_filter_config = Some(*config);
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), HwError> {
        self.mic_filter_config = None;
        self.mic_filter_deinits += 1;
        Ok(())
    }

    fn start_acquisition(&mut self, scratch: *mut i32, bytes: u32) -> Result<(), HwError> {
        fail_if(self.faults.mic_start)?;
        self.acquisition = Some((scratch as usize, bytes));
        self.acquisition_starts += 1;
        Ok(())
    }

    fn stop_acquisition(&mut self) -> Result<(), HwError> {
        self.acquisition = None;
        self.acquisition_stops += 1;
        Ok(())
    }
}

impl DmaController for MockHardware {
    fn link(&mut self, channel: DmaChannel, queue: &DescriptorQueue) -> Result<(), HwError> {
        fail_if(self.faults.dma_link)?;
        assert!(queue.is_circular(), "linked a non-circular chain");
        self.linked[channel.index()] = true;
        self.widths[channel.index()] = queue.head().map(|d| d.data_width());
        self.dma_link_count += 1;
        Ok(())
    }

    fn update_head(&mut self, channel: DmaChannel, queue: &DescriptorQueue) -> Result<(), HwError> {
        fail_if(self.faults.dma_update)?;
        assert!(self.linked[channel.index()], "head reload on an unlinked channel");
        assert!(queue.is_circular(), "reloaded a non-circular chain");
        self.widths[channel.index()] = queue.head().map(|d| d.data_width());
        self.dma_head_updates += 1;
        Ok(())
    }

    fn unlink(&mut self, channel: DmaChannel) -> Result<(), HwError> {
        self.linked[channel.index()] = false;
        self.widths[channel.index()] = None;
        fail_if(self.faults.dma_unlink)
    }

    fn set_irq_enabled(&mut self, channel: DmaChannel, enabled: bool) {
        self.irq_enabled[channel.index()] = enabled;
    }

    fn take_event(&mut self, channel: DmaChannel) -> Option<TransferEvent> {
        self.events[channel.index()].pop_front()
    }
}

// ── Codec ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    Init(CodecInit),
    DeInit,
    Play,
    Pause,
    Resume,
    Stop,
    SetMute(bool),
    SetVolume(VolumeTarget, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockCodecError;

#[derive(Debug)]
pub struct MockCodec {
    pub id: u32,
    pub probe_count: u32,
    pub fail_probe: bool,
    pub fail_init: bool,
    pub fail_play: bool,
    pub fail_stop: bool,
    /// Successful commands, in order.
    pub ops: Vec<CodecOp>,
}

impl MockCodec {
    pub fn new() -> Self {
        MockCodec {
            id: WM8904_ID,
            probe_count: 0,
            fail_probe: false,
            fail_init: false,
            fail_play: false,
            fail_stop: false,
            ops: Vec::new(),
        }
    }

    fn record(&mut self, fail: bool, op: CodecOp) -> Result<(), MockCodecError> {
        if fail {
            return Err(MockCodecError);
        }
        self.ops.push(op);
        Ok(())
    }
}

impl Default for MockCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCodec for MockCodec {
    type Error = MockCodecError;

    fn init(&mut self, config: &CodecInit) -> Result<(), Self::Error> {
        self.record(self.fail_init, CodecOp::Init(*config))
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        self.record(false, CodecOp::DeInit)
    }

    fn play(&mut self) -> Result<(), Self::Error> {
        self.record(self.fail_play, CodecOp::Play)
    }

    fn pause(&mut self) -> Result<(), Self::Error> {
        self.record(false, CodecOp::Pause)
    }

    fn resume(&mut self) -> Result<(), Self::Error> {
        self.record(false, CodecOp::Resume)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.record(self.fail_stop, CodecOp::Stop)
    }

    fn set_mute(&mut self, mute: bool) -> Result<(), Self::Error> {
        self.record(false, CodecOp::SetMute(mute))
    }

    fn set_volume(&mut self, target: VolumeTarget, percent: u8) -> Result<(), Self::Error> {
        self.record(false, CodecOp::SetVolume(target, percent))
    }
}

impl CodecProbe for MockCodec {
    type Error = MockCodecError;

    fn read_id(&mut self) -> Result<u32, Self::Error> {
        self.probe_count += 1;
        if self.fail_probe {
            Err(MockCodecError)
        } else {
            Ok(self.id)
        }
    }
}

// ── Callbacks ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Length of the half handed out.
    OutHalf(usize),
    OutComplete(usize),
    OutError,
    InHalf(InputInstance, Vec<u8>),
    InComplete(InputInstance, Vec<u8>),
    InError(InputInstance),
}

#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    pub log: Vec<Callback>,
    pub out_errors: u32,
    pub in_errors: [u32; 2],
    /// Byte written over each output half handed out.
    pub refill: Option<u8>,
}

impl AudioCallbacks for RecordingCallbacks {
    fn out_half_transfer(&mut self, first_half: &mut [u8]) {
        if let Some(byte) = self.refill {
            first_half.fill(byte);
        }
        self.log.push(Callback::OutHalf(first_half.len()));
    }

    fn out_transfer_complete(&mut self, second_half: &mut [u8]) {
        if let Some(byte) = self.refill {
            second_half.fill(byte);
        }
        self.log.push(Callback::OutComplete(second_half.len()));
    }

    fn out_error(&mut self) {
        self.out_errors += 1;
        self.log.push(Callback::OutError);
    }

    fn in_half_transfer(&mut self, instance: InputInstance, first_half: &[u8]) {
        self.log.push(Callback::InHalf(instance, first_half.to_vec()));
    }

    fn in_transfer_complete(&mut self, instance: InputInstance, second_half: &[u8]) {
        self.log.push(Callback::InComplete(instance, second_half.to_vec()));
    }

    fn in_error(&mut self, instance: InputInstance) {
        self.in_errors[instance.index()] += 1;
        self.log.push(Callback::InError(instance));
    }
}
