//! Status taxonomy returned by every public operation.
//!
//! Interrupt-context failures never come through here; they surface through
//! [`AudioCallbacks`](crate::dispatch::AudioCallbacks) error hooks instead.

/// Failure kinds reported at the public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An argument is out of range (buffer length, volume, raw instance id).
    #[error("wrong parameter")]
    WrongParam,
    /// The stream is not in a state that allows the operation.
    #[error("stream busy")]
    Busy,
    /// The path cannot do what was asked (bit depth, channel count, device, volume).
    #[error("feature not supported")]
    FeatureNotSupported,
    /// PLL lock or kernel-clock mux selection failed.
    #[error("clock configuration failed")]
    ClockFailure,
    /// Serial-audio port, mic filter or DMA descriptor setup failed.
    #[error("peripheral failure")]
    PeriphFailure,
    /// The codec rejected a command or could not be bound.
    #[error("component failure")]
    ComponentFailure,
    /// The codec control bus did not answer.
    #[error("bus failure")]
    BusFailure,
    /// The codec answered with an unexpected identifier.
    #[error("unknown component")]
    UnknownComponent,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
