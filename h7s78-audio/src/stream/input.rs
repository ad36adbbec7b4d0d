//! Capture: analog mic through the codec, digital mic through the filter.
//!
//! | Instance | Engine | Format | Volume |
//! |----------|--------|--------|--------|
//! | [`AnalogMic`](InputInstance::AnalogMic) | serial-audio port, receive | 16-bit stereo | codec input PGA |
//! | [`DigitalMic`](InputInstance::DigitalMic) | mic filter + scratch | 16-bit mono | not supported |
//!
//! The digital-mic filter writes raw 32-bit words into the subsystem's
//! scratch buffer; the dispatcher rescales them into the caller's buffer
//! one half at a time. Its engine cannot be paused, so Pause stops the
//! acquisition and Resume restarts it with the original geometry.

use crate::clock::ClockConfig;
use crate::codec::{AudioCodec, CodecInit, CodecPath, CodecProbe, VolumeTarget};
use crate::config::{AudioInit, BitsPerSample, Device, InputDevice, InputInstance, SampleRate};
use crate::constants::MAX_TRANSFER_BYTES;
use crate::dispatch::AudioCallbacks;
use crate::dma::DescriptorConfig;
use crate::error::{Error, Result};
use crate::hw::{AudioHardware, DmaChannel, Direction, MicFilterPort, SerialAudioConfig, SerialAudioPort};
use crate::periph::PeripheralInit;

use super::output::check_serial_rate;
use super::{codec_call, first_error, AudioSubsystem, BringUp, BufferError, StreamState, Transition};

impl InputInstance {
    pub(crate) const fn dma_channel(self) -> DmaChannel {
        match self {
            InputInstance::AnalogMic => DmaChannel::SerialAudioRx,
            InputInstance::DigitalMic => DmaChannel::DigitalMicRx,
        }
    }
}

/// Bytes the mic filter writes per record of `len` caller bytes: one
/// 32-bit word per 16-bit output sample.
const fn mic_acquisition_bytes(len: usize) -> u32 {
    (len as u32) * 2
}

impl<H, C, CB, K, I> AudioSubsystem<H, C, CB, K, I>
where
    H: AudioHardware,
    C: AudioCodec + CodecProbe,
    CB: AudioCallbacks,
    K: ClockConfig,
    I: PeripheralInit,
{
    // ── Lifecycle ───────────────────────────────────────────────────

    /// Bring up one capture path.
    ///
    /// | Check | Error |
    /// |-------|-------|
    /// | already initialised | `Busy` |
    /// | volume > 100 | `WrongParam` |
    /// | device is not this instance's, bits ≠ 16, channel mismatch | `FeatureNotSupported` |
    /// | analog: rate > 96 kHz, output initialised | `FeatureNotSupported` |
    ///
    /// Any failure after the checks returns the instance to `Reset`.
    pub fn init_input(&mut self, instance: InputInstance, config: &AudioInit) -> Result<()> {
        let next = self.inputs[instance.index()].check(Transition::Init)?;
        if config.volume > 100 {
            return Err(Error::WrongParam);
        }
        if config.device != Device::Input(instance.device()) {
            return Err(Error::FeatureNotSupported);
        }
        if config.bits_per_sample != BitsPerSample::Bits16 || config.channels != instance.channels() {
            return Err(Error::FeatureNotSupported);
        }
        if instance == InputInstance::AnalogMic {
            check_serial_rate(config.sample_rate)?;
            if self.output.state != StreamState::Reset {
                warn!("input: serial-audio port held by output");
                return Err(Error::FeatureNotSupported);
            }
        }

        let ctx = &mut self.inputs[instance.index()];
        ctx.configure(config);
        ctx.enter(StreamState::Init);
        let mut reached = BringUp::Untouched;
        let brought_up = match instance {
            InputInstance::AnalogMic => self.bring_up_analog_mic(&mut reached),
            InputInstance::DigitalMic => self.bring_up_digital_mic(&mut reached),
        };
        match brought_up {
            Ok(()) => {
                self.inputs[instance.index()].enter(next);
                info!("input: {} ready at {} Hz", instance, config.sample_rate.hz());
                Ok(())
            }
            Err(e) => {
                warn!("input: {} init failed: {}", instance, e);
                match instance {
                    InputInstance::AnalogMic => self.roll_back_serial_audio(reached, DmaChannel::SerialAudioRx),
                    InputInstance::DigitalMic => self.roll_back_mic_filter(reached),
                }
                self.inputs[instance.index()].reset();
                self.unbind_codec_if_idle();
                Err(e)
            }
        }
    }

    fn bring_up_analog_mic(&mut self, reached: &mut BringUp) -> Result<()> {
        self.codec.bind().map_err(|e| {
            warn!("input: codec probe failed: {}", e);
            Error::ComponentFailure
        })?;

        let ctx = &self.inputs[InputInstance::AnalogMic.index()];
        let (rate, volume) = (ctx.sample_rate, ctx.volume);
        self.clock.serial_audio_clock(&mut self.hw, rate)?;

        SerialAudioPort::msp_init(&mut self.hw);
        *reached = BringUp::Msp;
        if let Err(e) = self
            .queues
            .prepare(&mut self.hw, DmaChannel::SerialAudioRx, &DescriptorConfig::serial_audio_rx())
        {
            self.callbacks.in_error(InputInstance::AnalogMic);
            return Err(e.into());
        }

        let port = SerialAudioConfig::master(Direction::Receive, rate, BitsPerSample::Bits16);
        self.periph
            .serial_audio(&mut self.hw, &port)
            .map_err(|_| Error::PeriphFailure)?;
        *reached = BringUp::Port;

        let codec_init = CodecInit {
            path: CodecPath::AnalogMic,
            sample_rate: rate,
            bits_per_sample: BitsPerSample::Bits16,
            volume,
        };
        codec_call(&mut self.codec, "init", |c| c.init(&codec_init))
    }

    fn bring_up_digital_mic(&mut self, reached: &mut BringUp) -> Result<()> {
        let rate = self.inputs[InputInstance::DigitalMic.index()].sample_rate;
        self.clock.digital_mic_clock(&mut self.hw, rate)?;

        MicFilterPort::msp_init(&mut self.hw);
        *reached = BringUp::Msp;
        if let Err(e) = self
            .queues
            .prepare(&mut self.hw, DmaChannel::DigitalMicRx, &DescriptorConfig::digital_mic_rx())
        {
            self.callbacks.in_error(InputInstance::DigitalMic);
            return Err(e.into());
        }

        self.periph
            .mic_filter(&mut self.hw, rate)
            .map_err(|_| Error::PeriphFailure)?;
        *reached = BringUp::Port;
        Ok(())
    }

    fn roll_back_mic_filter(&mut self, reached: BringUp) {
        if reached >= BringUp::Port && MicFilterPort::deinit(&mut self.hw).is_err() {
            warn!("input: mic filter deinit after failed init rejected");
        }
        if reached >= BringUp::Msp {
            MicFilterPort::msp_deinit(&mut self.hw);
        }
        if let Err(e) = self.queues.release(&mut self.hw, DmaChannel::DigitalMicRx) {
            warn!("{}: release after failed init: {}", DmaChannel::DigitalMicRx, e);
        }
    }

    /// Tear a capture path down to `Reset`.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned. A no-op in `Reset`.
    pub fn deinit_input(&mut self, instance: InputInstance) -> Result<()> {
        let state = self.inputs[instance.index()].state;
        if state == StreamState::Reset {
            return Ok(());
        }

        let mut failure = None;
        match instance {
            InputInstance::AnalogMic => {
                if state.is_active() {
                    first_error(
                        &mut failure,
                        SerialAudioPort::stop(&mut self.hw, Direction::Receive).map_err(|_| Error::PeriphFailure),
                    );
                }
                first_error(
                    &mut failure,
                    SerialAudioPort::deinit(&mut self.hw).map_err(|_| Error::PeriphFailure),
                );
                SerialAudioPort::msp_deinit(&mut self.hw);
            }
            InputInstance::DigitalMic => {
                if state == StreamState::Streaming {
                    first_error(
                        &mut failure,
                        self.hw.stop_acquisition().map_err(|_| Error::PeriphFailure),
                    );
                }
                first_error(
                    &mut failure,
                    MicFilterPort::deinit(&mut self.hw).map_err(|_| Error::PeriphFailure),
                );
                MicFilterPort::msp_deinit(&mut self.hw);
            }
        }
        first_error(
            &mut failure,
            self.queues
                .release(&mut self.hw, instance.dma_channel())
                .map_err(Error::from),
        );
        if instance == InputInstance::AnalogMic && self.codec.is_bound() {
            first_error(&mut failure, codec_call(&mut self.codec, "deinit", |c| c.deinit()));
        }

        let ctx = &mut self.inputs[instance.index()];
        ctx.enter(StreamState::Reset);
        ctx.reset();
        self.unbind_codec_if_idle();
        match failure {
            Some(e) => {
                warn!("input: {} deinit: {}", instance, e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    // ── Transport ───────────────────────────────────────────────────

    /// Start circular capture into `buffer`.
    ///
    /// A digital-mic record of `n` bytes needs `n / 2` words of scratch;
    /// a longer buffer is `WrongParam`.
    pub fn record(
        &mut self,
        instance: InputInstance,
        buffer: &'static mut [u8],
    ) -> core::result::Result<(), BufferError> {
        let len = buffer.len();
        if len > MAX_TRANSFER_BYTES {
            return Err(BufferError::new(Error::WrongParam, buffer));
        }
        if instance == InputInstance::DigitalMic && len / 2 > self.scratch.len() {
            return Err(BufferError::new(Error::WrongParam, buffer));
        }
        let next = match self.inputs[instance.index()].check(Transition::Start) {
            Ok(next) => next,
            Err(e) => return Err(BufferError::new(e, buffer)),
        };

        match instance {
            InputInstance::AnalogMic => {
                if let Err(e) = codec_call(&mut self.codec, "play", |c| c.play()) {
                    return Err(BufferError::new(e, buffer));
                }
                let units = (len / 2) as u16;
                if SerialAudioPort::start(&mut self.hw, Direction::Receive, buffer.as_mut_ptr(), units).is_err() {
                    warn!("input: analog transfer start rejected");
                    if let Err(e) = codec_call(&mut self.codec, "stop", |c| c.stop()) {
                        warn!("input: codec left running after failed start: {}", e);
                    }
                    return Err(BufferError::new(Error::PeriphFailure, buffer));
                }
            }
            InputInstance::DigitalMic => {
                let scratch = self.scratch.as_mut_ptr();
                if self.hw.start_acquisition(scratch, mic_acquisition_bytes(len)).is_err() {
                    warn!("input: acquisition start rejected");
                    return Err(BufferError::new(Error::PeriphFailure, buffer));
                }
            }
        }

        let ctx = &mut self.inputs[instance.index()];
        ctx.buffer = Some(buffer);
        ctx.enter(next);
        Ok(())
    }

    /// Suspend capture. The digital mic's acquisition is stopped outright.
    pub fn pause_input(&mut self, instance: InputInstance) -> Result<()> {
        let next = self.inputs[instance.index()].check(Transition::Pause)?;
        let paused = match instance {
            InputInstance::AnalogMic => SerialAudioPort::pause(&mut self.hw, Direction::Receive),
            InputInstance::DigitalMic => self.hw.stop_acquisition(),
        };
        paused.map_err(|_| Error::PeriphFailure)?;
        self.inputs[instance.index()].enter(next);
        Ok(())
    }

    /// Continue capture. The digital mic restarts acquisition with the
    /// length given to [`record`](Self::record).
    pub fn resume_input(&mut self, instance: InputInstance) -> Result<()> {
        let next = self.inputs[instance.index()].check(Transition::Resume)?;
        let resumed = match instance {
            InputInstance::AnalogMic => SerialAudioPort::resume(&mut self.hw, Direction::Receive),
            InputInstance::DigitalMic => {
                let len = self.inputs[instance.index()].buffer.as_ref().map_or(0, |b| b.len());
                let scratch = self.scratch.as_mut_ptr();
                self.hw.start_acquisition(scratch, mic_acquisition_bytes(len))
            }
        };
        resumed.map_err(|_| Error::PeriphFailure)?;
        self.inputs[instance.index()].enter(next);
        Ok(())
    }

    /// Abort capture and hand the buffer back.
    ///
    /// `Ok(None)` when already Stopped. The instance ends Stopped even when
    /// a step fails; the first failure is returned together with the buffer.
    pub fn stop_input(
        &mut self,
        instance: InputInstance,
    ) -> core::result::Result<Option<&'static mut [u8]>, BufferError> {
        let ctx = &self.inputs[instance.index()];
        if ctx.state == StreamState::Stopped {
            return Ok(None);
        }
        let next = ctx.check(Transition::Stop).map_err(BufferError::bare)?;
        let streaming = ctx.state == StreamState::Streaming;

        let mut failure = None;
        match instance {
            InputInstance::AnalogMic => {
                first_error(&mut failure, codec_call(&mut self.codec, "stop", |c| c.stop()));
                first_error(
                    &mut failure,
                    SerialAudioPort::stop(&mut self.hw, Direction::Receive).map_err(|_| Error::PeriphFailure),
                );
            }
            // A paused digital mic is already stopped.
            InputInstance::DigitalMic if streaming => {
                first_error(
                    &mut failure,
                    self.hw.stop_acquisition().map_err(|_| Error::PeriphFailure),
                );
            }
            InputInstance::DigitalMic => {}
        }

        let ctx = &mut self.inputs[instance.index()];
        ctx.enter(next);
        let buffer = ctx.buffer.take();
        match failure {
            Some(error) => Err(BufferError { error, buffer }),
            None => Ok(buffer),
        }
    }

    pub fn input_state(&self, instance: InputInstance) -> StreamState {
        self.input(instance).state
    }

    // ── Volume ──────────────────────────────────────────────────────

    /// Analog-mic gain in percent through the codec's input PGA. Only while
    /// Stopped. The digital mic has no gain control.
    pub fn set_input_volume(&mut self, instance: InputInstance, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(Error::WrongParam);
        }
        if instance == InputInstance::DigitalMic {
            return Err(Error::FeatureNotSupported);
        }
        self.inputs[instance.index()].require_stopped()?;
        codec_call(&mut self.codec, "set_volume", |c| c.set_volume(VolumeTarget::Input, volume))?;
        self.inputs[instance.index()].volume = volume;
        Ok(())
    }

    pub fn input_volume(&self, instance: InputInstance) -> Result<u8> {
        if instance == InputInstance::DigitalMic {
            return Err(Error::FeatureNotSupported);
        }
        let ctx = self.input(instance);
        ctx.require_initialized()?;
        Ok(ctx.volume)
    }

    // ── Format ──────────────────────────────────────────────────────

    /// Re-clock the path for `rate`. Only while Stopped.
    ///
    /// The digital mic's filter is de-initialised and re-initialised with
    /// the table entry for the new rate. A paused digital mic is `Busy`:
    /// its restart geometry belongs to the old rate.
    pub fn set_input_sample_rate(&mut self, instance: InputInstance, rate: SampleRate) -> Result<()> {
        let ctx = self.input(instance);
        ctx.require_stopped()?;
        if ctx.sample_rate == rate {
            return Ok(());
        }

        match instance {
            InputInstance::AnalogMic => {
                check_serial_rate(rate)?;
                self.clock.serial_audio_clock(&mut self.hw, rate)?;
                let port = SerialAudioConfig::master(Direction::Receive, rate, BitsPerSample::Bits16);
                self.reinit_serial_audio(&port)?;
            }
            InputInstance::DigitalMic => {
                self.clock.digital_mic_clock(&mut self.hw, rate)?;
                MicFilterPort::deinit(&mut self.hw).map_err(|_| Error::PeriphFailure)?;
                MicFilterPort::msp_init(&mut self.hw);
                self.periph
                    .mic_filter(&mut self.hw, rate)
                    .map_err(|_| Error::PeriphFailure)?;
            }
        }
        self.inputs[instance.index()].sample_rate = rate;
        debug!("input: {} rate now {} Hz", instance, rate.hz());
        Ok(())
    }

    pub fn input_sample_rate(&self, instance: InputInstance) -> Result<SampleRate> {
        let ctx = self.input(instance);
        ctx.require_initialized()?;
        Ok(ctx.sample_rate)
    }

    /// Both capture paths are fixed at 16 bits.
    pub fn set_input_bits_per_sample(&mut self, instance: InputInstance, bits: BitsPerSample) -> Result<()> {
        if bits != BitsPerSample::Bits16 {
            return Err(Error::FeatureNotSupported);
        }
        self.input(instance).require_stopped()
    }

    pub fn input_bits_per_sample(&self, instance: InputInstance) -> Result<BitsPerSample> {
        let ctx = self.input(instance);
        ctx.require_initialized()?;
        Ok(ctx.bits_per_sample)
    }

    /// Channel counts are fixed per path: 2 analog, 1 digital.
    pub fn set_input_channels(&mut self, instance: InputInstance, channels: u8) -> Result<()> {
        if channels != instance.channels() {
            return Err(Error::FeatureNotSupported);
        }
        self.input(instance).require_stopped()
    }

    pub fn input_channels(&self, instance: InputInstance) -> Result<u8> {
        let ctx = self.input(instance);
        ctx.require_initialized()?;
        Ok(ctx.channels)
    }

    /// Each instance captures from exactly one device.
    pub fn set_input_device(&mut self, instance: InputInstance, device: InputDevice) -> Result<()> {
        self.input(instance).require_stopped()?;
        if device != instance.device() {
            return Err(Error::FeatureNotSupported);
        }
        Ok(())
    }

    pub fn input_device(&self, instance: InputInstance) -> Result<InputDevice> {
        let ctx = self.input(instance);
        ctx.require_initialized()?;
        match ctx.device {
            Device::Input(device) => Ok(device),
            Device::Output(_) => Err(Error::FeatureNotSupported),
        }
    }
}
