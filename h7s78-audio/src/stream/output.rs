//! Headphone playback over the serial-audio port.

use crate::clock::ClockConfig;
use crate::codec::{AudioCodec, CodecInit, CodecPath, CodecProbe, VolumeTarget};
use crate::config::{AudioInit, BitsPerSample, Device, InputInstance, OutputDevice, SampleRate};
use crate::constants::MAX_TRANSFER_BYTES;
use crate::dispatch::AudioCallbacks;
use crate::dma::DescriptorConfig;
use crate::error::{Error, Result};
use crate::hw::{AudioHardware, DmaChannel, Direction, SerialAudioConfig, SerialAudioPort};
use crate::periph::PeripheralInit;

use super::{codec_call, first_error, AudioSubsystem, BringUp, BufferError, StreamState, Transition};

/// Output channel count; the codec interface is always stereo.
const OUTPUT_CHANNELS: u8 = 2;

/// Bit depths the output path carries. 24-bit samples travel in 32-bit words.
fn check_output_bits(bits: BitsPerSample) -> Result<()> {
    match bits {
        BitsPerSample::Bits16 | BitsPerSample::Bits24 => Ok(()),
        BitsPerSample::Bits8 | BitsPerSample::Bits32 => Err(Error::FeatureNotSupported),
    }
}

/// Rates the codec's serial interface can be clocked at.
pub(crate) fn check_serial_rate(rate: SampleRate) -> Result<()> {
    if rate > SampleRate::Hz96000 {
        Err(Error::FeatureNotSupported)
    } else {
        Ok(())
    }
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

    /// Bring up headphone playback: clock, serial-audio port in master
    /// transmit, descriptor chain, codec.
    ///
    /// | Check | Error |
    /// |-------|-------|
    /// | device not an output, volume > 100 | `WrongParam` |
    /// | 8/32-bit, channels ≠ 2, rate > 96 kHz | `FeatureNotSupported` |
    /// | analog input initialised | `FeatureNotSupported` |
    /// | already initialised | `Busy` |
    ///
    /// Any failure after the checks returns the stream to `Reset`.
    pub fn init_output(&mut self, config: &AudioInit) -> Result<()> {
        if !matches!(config.device, Device::Output(_)) || config.volume > 100 {
            return Err(Error::WrongParam);
        }
        check_output_bits(config.bits_per_sample)?;
        if config.channels != OUTPUT_CHANNELS {
            return Err(Error::FeatureNotSupported);
        }
        check_serial_rate(config.sample_rate)?;
        if self.input(InputInstance::AnalogMic).state != StreamState::Reset {
            warn!("output: serial-audio port held by analog input");
            return Err(Error::FeatureNotSupported);
        }
        let next = self.output.check(Transition::Init)?;

        self.output.configure(config);
        self.output.enter(StreamState::Init);
        let mut reached = BringUp::Untouched;
        match self.bring_up_output(&mut reached) {
            Ok(()) => {
                self.output.enter(next);
                info!("output: ready at {} Hz", config.sample_rate.hz());
                Ok(())
            }
            Err(e) => {
                warn!("output: init failed: {}", e);
                self.roll_back_serial_audio(reached, DmaChannel::SerialAudioTx);
                self.output.reset();
                self.unbind_codec_if_idle();
                Err(e)
            }
        }
    }

    fn bring_up_output(&mut self, reached: &mut BringUp) -> Result<()> {
        self.codec.bind().map_err(|e| {
            warn!("output: codec probe failed: {}", e);
            Error::ComponentFailure
        })?;

        let rate = self.output.sample_rate;
        let bits = self.output.bits_per_sample;
        self.clock.serial_audio_clock(&mut self.hw, rate)?;

        SerialAudioPort::msp_init(&mut self.hw);
        *reached = BringUp::Msp;
        if let Err(e) = self
            .queues
            .prepare(&mut self.hw, DmaChannel::SerialAudioTx, &DescriptorConfig::serial_audio_tx(bits))
        {
            warn!("output: descriptor chain: {}", e);
            self.callbacks.out_error();
            return Err(e.into());
        }

        let port = SerialAudioConfig::master(Direction::Transmit, rate, bits);
        self.periph
            .serial_audio(&mut self.hw, &port)
            .map_err(|_| Error::PeriphFailure)?;
        *reached = BringUp::Port;

        let codec_init = CodecInit {
            path: CodecPath::Headphone,
            sample_rate: rate,
            bits_per_sample: bits,
            volume: self.output.volume,
        };
        codec_call(&mut self.codec, "init", |c| c.init(&codec_init))
    }

    /// Undo the serial-audio steps of a failed Init up to `reached` and
    /// clear `channel`'s chain. Failures here are only logged.
    pub(super) fn roll_back_serial_audio(&mut self, reached: BringUp, channel: DmaChannel) {
        if reached >= BringUp::Port && SerialAudioPort::deinit(&mut self.hw).is_err() {
            warn!("serial audio: deinit after failed init rejected");
        }
        if reached >= BringUp::Msp {
            SerialAudioPort::msp_deinit(&mut self.hw);
        }
        if let Err(e) = self.queues.release(&mut self.hw, channel) {
            warn!("{}: release after failed init: {}", channel, e);
        }
    }

    /// De-initialise the serial-audio port and initialise it with `port`.
    /// Pins and bus clock stay enabled.
    pub(super) fn reinit_serial_audio(&mut self, port: &SerialAudioConfig) -> Result<()> {
        SerialAudioPort::deinit(&mut self.hw).map_err(|_| Error::PeriphFailure)?;
        self.periph
            .serial_audio(&mut self.hw, port)
            .map_err(|_| Error::PeriphFailure)
    }

    /// Tear playback down to `Reset`.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned. A no-op in `Reset`.
    pub fn deinit_output(&mut self) -> Result<()> {
        if self.output.state == StreamState::Reset {
            return Ok(());
        }
        let mut failure = None;
        if self.output.state.is_active() {
            first_error(
                &mut failure,
                SerialAudioPort::stop(&mut self.hw, Direction::Transmit).map_err(|_| Error::PeriphFailure),
            );
        }
        first_error(
            &mut failure,
            SerialAudioPort::deinit(&mut self.hw).map_err(|_| Error::PeriphFailure),
        );
        SerialAudioPort::msp_deinit(&mut self.hw);
        first_error(
            &mut failure,
            self.queues
                .release(&mut self.hw, DmaChannel::SerialAudioTx)
                .map_err(Error::from),
        );
        if self.codec.is_bound() {
            first_error(&mut failure, codec_call(&mut self.codec, "deinit", |c| c.deinit()));
        }

        self.output.enter(StreamState::Reset);
        self.output.reset();
        self.unbind_codec_if_idle();
        match failure {
            Some(e) => {
                warn!("output: deinit: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    // ── Transport ───────────────────────────────────────────────────

    /// Start circular playback of `buffer`.
    ///
    /// The codec is told to play before the DMA transfer is armed. The
    /// half-transfer and transfer-complete callbacks fire as each half of
    /// `buffer` has been sent and may be refilled.
    pub fn play(&mut self, buffer: &'static mut [u8]) -> core::result::Result<(), BufferError> {
        if buffer.len() > MAX_TRANSFER_BYTES {
            return Err(BufferError::new(Error::WrongParam, buffer));
        }
        let next = match self.output.check(Transition::Start) {
            Ok(next) => next,
            Err(e) => return Err(BufferError::new(e, buffer)),
        };
        let units = (buffer.len() / self.output.bits_per_sample.bytes_per_transfer()) as u16;

        if let Err(e) = codec_call(&mut self.codec, "play", |c| c.play()) {
            return Err(BufferError::new(e, buffer));
        }
        if SerialAudioPort::start(&mut self.hw, Direction::Transmit, buffer.as_mut_ptr(), units).is_err() {
            warn!("output: transfer start rejected");
            if let Err(e) = codec_call(&mut self.codec, "stop", |c| c.stop()) {
                warn!("output: codec left playing after failed start: {}", e);
            }
            return Err(BufferError::new(Error::PeriphFailure, buffer));
        }

        self.output.buffer = Some(buffer);
        self.output.enter(next);
        Ok(())
    }

    pub fn pause_output(&mut self) -> Result<()> {
        let next = self.output.check(Transition::Pause)?;
        codec_call(&mut self.codec, "pause", |c| c.pause())?;
        if SerialAudioPort::pause(&mut self.hw, Direction::Transmit).is_err() {
            warn!("output: port pause rejected");
            // Still Streaming, so the codec has to keep playing.
            if let Err(e) = codec_call(&mut self.codec, "resume", |c| c.resume()) {
                warn!("output: codec left paused: {}", e);
            }
            return Err(Error::PeriphFailure);
        }
        self.output.enter(next);
        Ok(())
    }

    pub fn resume_output(&mut self) -> Result<()> {
        let next = self.output.check(Transition::Resume)?;
        SerialAudioPort::resume(&mut self.hw, Direction::Transmit).map_err(|_| Error::PeriphFailure)?;
        codec_call(&mut self.codec, "resume", |c| c.resume())?;
        self.output.enter(next);
        Ok(())
    }

    /// Abort playback and hand the buffer back.
    ///
    /// `Ok(None)` when already Stopped. The stream ends Stopped even when
    /// the codec or the port fails; the first failure is returned together
    /// with the buffer.
    pub fn stop_output(&mut self) -> core::result::Result<Option<&'static mut [u8]>, BufferError> {
        if self.output.state == StreamState::Stopped {
            return Ok(None);
        }
        let next = self.output.check(Transition::Stop).map_err(BufferError::bare)?;

        let mut failure = None;
        first_error(&mut failure, codec_call(&mut self.codec, "stop", |c| c.stop()));
        first_error(
            &mut failure,
            SerialAudioPort::stop(&mut self.hw, Direction::Transmit).map_err(|_| Error::PeriphFailure),
        );
        self.output.enter(next);

        let buffer = self.output.buffer.take();
        match failure {
            Some(error) => Err(BufferError { error, buffer }),
            None => Ok(buffer),
        }
    }

    pub fn output_state(&self) -> StreamState {
        self.output.state
    }

    // ── Mute and volume ─────────────────────────────────────────────

    pub fn mute_output(&mut self) -> Result<()> {
        self.set_output_mute(true)
    }

    pub fn unmute_output(&mut self) -> Result<()> {
        self.set_output_mute(false)
    }

    fn set_output_mute(&mut self, mute: bool) -> Result<()> {
        self.output.require_initialized()?;
        if self.output.muted == mute {
            return Ok(());
        }
        codec_call(&mut self.codec, "set_mute", |c| c.set_mute(mute))?;
        self.output.muted = mute;
        Ok(())
    }

    pub fn is_output_muted(&self) -> Result<bool> {
        self.output.require_initialized()?;
        Ok(self.output.muted)
    }

    /// Headphone volume in percent. Only while Stopped.
    pub fn set_output_volume(&mut self, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(Error::WrongParam);
        }
        self.output.require_stopped()?;
        codec_call(&mut self.codec, "set_volume", |c| c.set_volume(VolumeTarget::Output, volume))?;
        self.output.volume = volume;
        Ok(())
    }

    pub fn output_volume(&self) -> Result<u8> {
        self.output.require_initialized()?;
        Ok(self.output.volume)
    }

    // ── Format ──────────────────────────────────────────────────────

    /// Re-clock and re-initialise the port for `rate`. Only while Stopped.
    pub fn set_output_sample_rate(&mut self, rate: SampleRate) -> Result<()> {
        self.output.require_stopped()?;
        if self.output.sample_rate == rate {
            return Ok(());
        }
        check_serial_rate(rate)?;

        self.clock.serial_audio_clock(&mut self.hw, rate)?;
        let port = SerialAudioConfig::master(Direction::Transmit, rate, self.output.bits_per_sample);
        self.reinit_serial_audio(&port)?;
        self.output.sample_rate = rate;
        debug!("output: rate now {} Hz", rate.hz());
        Ok(())
    }

    pub fn output_sample_rate(&self) -> Result<SampleRate> {
        self.output.require_initialized()?;
        Ok(self.output.sample_rate)
    }

    /// Switch between 16- and 24-bit. Only while Stopped.
    ///
    /// The transmit chain's head descriptor is swapped for one of the new
    /// width and reloaded into the controller, then the port is
    /// de-initialised and initialised for the new frame size.
    pub fn set_output_bits_per_sample(&mut self, bits: BitsPerSample) -> Result<()> {
        check_output_bits(bits)?;
        self.output.require_stopped()?;
        if self.output.bits_per_sample == bits {
            return Ok(());
        }

        if let Err(e) = self
            .queues
            .prepare(&mut self.hw, DmaChannel::SerialAudioTx, &DescriptorConfig::serial_audio_tx(bits))
        {
            warn!("output: descriptor reload: {}", e);
            self.callbacks.out_error();
            return Err(e.into());
        }
        let port = SerialAudioConfig::master(Direction::Transmit, self.output.sample_rate, bits);
        self.reinit_serial_audio(&port)?;
        self.output.bits_per_sample = bits;
        Ok(())
    }

    pub fn output_bits_per_sample(&self) -> Result<BitsPerSample> {
        self.output.require_initialized()?;
        Ok(self.output.bits_per_sample)
    }

    /// The output is fixed stereo; anything else is `FeatureNotSupported`.
    pub fn set_output_channels(&mut self, channels: u8) -> Result<()> {
        if channels != OUTPUT_CHANNELS {
            return Err(Error::FeatureNotSupported);
        }
        self.output.require_stopped()
    }

    pub fn output_channels(&self) -> Result<u8> {
        self.output.require_initialized()?;
        Ok(self.output.channels)
    }

    pub fn set_output_device(&mut self, device: OutputDevice) -> Result<()> {
        self.output.require_stopped()?;
        self.output.device = Device::Output(device);
        Ok(())
    }

    pub fn output_device(&self) -> Result<OutputDevice> {
        self.output.require_initialized()?;
        match self.output.device {
            Device::Output(device) => Ok(device),
            Device::Input(_) => Err(Error::FeatureNotSupported),
        }
    }

    /// Identify the codec on the control bus without initialising a stream.
    ///
    /// Unlike Init, which folds every probe failure into
    /// `ComponentFailure`, this reports `BusFailure` when the ID register
    /// cannot be read and `UnknownComponent` when it holds the wrong value.
    pub fn probe_codec(&mut self) -> Result<()> {
        self.codec.bind().map(|_| ()).map_err(Error::from)
    }
}
