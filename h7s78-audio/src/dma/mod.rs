//! Circular DMA descriptor chains.
//!
//! | Item | Role |
//! |------|------|
//! | [`Descriptor`] / [`DescriptorConfig`] | One transfer node (direction, width, burst) |
//! | [`DescriptorQueue`] | Fixed-capacity chain with optional loop-back |
//! | [`DescriptorQueues`] | Owns the three chains and binds them to the DMA controller |
//!
//! Each of the three channels (serial-audio out, serial-audio in, digital-mic
//! in) has its own chain, so reconfiguring one never touches a transfer in
//! flight on another.

mod descriptor;
mod queues;

pub use descriptor::{
    ChannelPriority, DataWidth, Descriptor, DescriptorConfig, DescriptorQueue, TransferDirection,
};
pub use queues::{DescriptorQueues, QueueSetup};

use crate::error::Error;
use crate::hw::HwError;

/// Why a chain operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Descriptor parameters were rejected.
    InvalidNode,
    /// No free slot for another node.
    Full,
    /// The operation needs at least one node.
    Empty,
    /// The chain is already circular.
    Circular,
    /// The DMA controller refused to attach, reload or detach the chain.
    Link(HwError),
}

impl From<QueueError> for Error {
    fn from(_: QueueError) -> Self {
        Error::PeriphFailure
    }
}
