//! Linked-list DMA descriptors and the fixed-capacity chain that holds them.
//!
//! A [`DescriptorQueue`] is an ordered list of [`Descriptor`]s. In circular
//! mode the last node links back to the head so the DMA engine cycles the
//! buffer forever without being re-armed. The chain lives in a plain array,
//! so there is no allocation and the hardware layer can walk it by index.

use crate::config::BitsPerSample;
use crate::constants::DESCRIPTOR_QUEUE_CAPACITY;

use super::QueueError;

/// Direction of a DMA transfer relative to memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    MemoryToPeripheral,
    PeripheralToMemory,
}

/// Width of one transfer unit on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    HalfWord,
    Word,
}

impl DataWidth {
    pub const fn bytes(self) -> usize {
        match self {
            DataWidth::HalfWord => 2,
            DataWidth::Word => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPriority {
    Low,
    Medium,
    High,
}

/// Parameters for building a [`Descriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorConfig {
    pub direction: TransferDirection,
    pub source_increment: bool,
    pub destination_increment: bool,
    pub data_width: DataWidth,
    /// Beats per burst, 1..=64.
    pub burst_length: u8,
    pub priority: ChannelPriority,
}

impl DescriptorConfig {
    /// Memory → serial-audio transmit FIFO.
    ///
    /// 16-bit audio moves in half-words, 24-bit audio in words.
    pub const fn serial_audio_tx(bits: BitsPerSample) -> Self {
        let data_width = match bits {
            BitsPerSample::Bits16 | BitsPerSample::Bits8 => DataWidth::HalfWord,
            BitsPerSample::Bits24 | BitsPerSample::Bits32 => DataWidth::Word,
        };
        DescriptorConfig {
            direction: TransferDirection::MemoryToPeripheral,
            source_increment: true,
            destination_increment: false,
            data_width,
            burst_length: 1,
            priority: ChannelPriority::High,
        }
    }

    /// Serial-audio receive FIFO → memory, always 16-bit.
    pub const fn serial_audio_rx() -> Self {
        DescriptorConfig {
            direction: TransferDirection::PeripheralToMemory,
            source_increment: false,
            destination_increment: true,
            data_width: DataWidth::HalfWord,
            burst_length: 1,
            priority: ChannelPriority::High,
        }
    }

    /// Mic-filter output register → memory, raw 32-bit words.
    pub const fn digital_mic_rx() -> Self {
        DescriptorConfig {
            direction: TransferDirection::PeripheralToMemory,
            source_increment: false,
            destination_increment: true,
            data_width: DataWidth::Word,
            burst_length: 1,
            priority: ChannelPriority::High,
        }
    }
}

/// A validated node ready to be placed in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor {
    config: DescriptorConfig,
}

impl Descriptor {
    /// Validate `config` and build a node.
    pub fn build(config: &DescriptorConfig) -> Result<Self, QueueError> {
        if !(1..=64).contains(&config.burst_length) {
            return Err(QueueError::InvalidNode);
        }
        let incrementing_side = match config.direction {
            TransferDirection::MemoryToPeripheral => config.source_increment,
            TransferDirection::PeripheralToMemory => config.destination_increment,
        };
        if !incrementing_side {
            return Err(QueueError::InvalidNode);
        }
        Ok(Descriptor { config: *config })
    }

    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    pub fn direction(&self) -> TransferDirection {
        self.config.direction
    }

    pub fn data_width(&self) -> DataWidth {
        self.config.data_width
    }
}

/// Fixed-capacity ordered descriptor chain.
///
/// An empty chain (no head) is uninitialised. Circular mode needs at least
/// one node.
#[derive(Debug, Clone)]
pub struct DescriptorQueue<const N: usize = DESCRIPTOR_QUEUE_CAPACITY> {
    nodes: [Option<Descriptor>; N],
    len: usize,
    circular: bool,
}

impl<const N: usize> DescriptorQueue<N> {
    pub const fn new() -> Self {
        assert!(N >= 1, "descriptor queue needs at least one slot");
        DescriptorQueue {
            nodes: [None; N],
            len: 0,
            circular: false,
        }
    }

    /// First node, `None` while uninitialised.
    pub fn head(&self) -> Option<&Descriptor> {
        self.nodes[0].as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.len > 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Nodes in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.nodes[..self.len].iter().flatten()
    }

    /// Index of the node the engine fetches after `index`, following the
    /// loop-back link when circular.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            None
        } else if index + 1 < self.len {
            Some(index + 1)
        } else if self.circular {
            Some(0)
        } else {
            None
        }
    }

    /// Append `node` after the current tail.
    ///
    /// Not allowed while circular: the loop-back link would skip the new node.
    pub fn insert_tail(&mut self, node: Descriptor) -> Result<(), QueueError> {
        if self.circular {
            return Err(QueueError::Circular);
        }
        if self.len == N {
            return Err(QueueError::Full);
        }
        self.nodes[self.len] = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Swap the head node in place, returning the old one.
    ///
    /// Chain length and the loop-back link are untouched, so an engine
    /// running on this chain picks up the new node on its next pass.
    pub fn replace_head(&mut self, node: Descriptor) -> Result<Descriptor, QueueError> {
        match self.nodes[0].replace(node) {
            Some(old) => Ok(old),
            None => {
                self.nodes[0] = None;
                Err(QueueError::Empty)
            }
        }
    }

    /// Link the tail back to the head.
    pub fn set_circular(&mut self) -> Result<(), QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        if self.circular {
            return Err(QueueError::Circular);
        }
        self.circular = true;
        Ok(())
    }

    /// Break the loop-back link. No-op on a linear chain.
    pub fn clear_circular(&mut self) {
        self.circular = false;
    }

    /// Drop every node and return to the uninitialised state.
    pub fn reset(&mut self) {
        self.nodes = [None; N];
        self.len = 0;
        self.circular = false;
    }
}

impl<const N: usize> Default for DescriptorQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
