use crate::hw::{DmaChannel, DmaController};

use super::{Descriptor, DescriptorConfig, DescriptorQueue, QueueError};

/// What [`DescriptorQueues::prepare`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueSetup {
    /// A fresh chain was built, linked and its interrupt enabled.
    Built,
    /// The head of an existing chain was swapped in place.
    Reconfigured,
}

/// The three per-channel chains.
///
/// Circular mode is on for a chain exactly while it is prepared: it is set
/// by [`prepare`](Self::prepare) and cleared by [`release`](Self::release),
/// which the stream layer calls when the owning stream returns to Reset.
#[derive(Debug, Clone)]
pub struct DescriptorQueues {
    queues: [DescriptorQueue; 3],
}

impl DescriptorQueues {
    pub const fn new() -> Self {
        DescriptorQueues {
            queues: [DescriptorQueue::new(), DescriptorQueue::new(), DescriptorQueue::new()],
        }
    }

    pub fn queue(&self, channel: DmaChannel) -> &DescriptorQueue {
        &self.queues[channel.index()]
    }

    /// Build or reconfigure the chain for `channel`.
    ///
    /// On first build the node becomes the sole chain member, the loop-back
    /// link is set, the chain is attached to the controller and the channel
    /// interrupt is enabled. On an already built chain only the head is
    /// replaced, the loop-back re-applied and the new head handed to the
    /// controller; the binding and interrupt stay as they are.
    ///
    /// A failed first build leaves the chain uninitialised; a failed
    /// reconfigure leaves it as it was.
    pub fn prepare<D>(
        &mut self,
        dma: &mut D,
        channel: DmaChannel,
        config: &DescriptorConfig,
    ) -> Result<QueueSetup, QueueError>
    where
        D: DmaController,
    {
        let node = Descriptor::build(config)?;
        let queue = &mut self.queues[channel.index()];

        if queue.is_initialized() {
            let mut swapped = queue.clone();
            swapped.replace_head(node)?;
            swapped.clear_circular();
            swapped.set_circular()?;
            dma.update_head(channel, &swapped).map_err(QueueError::Link)?;
            *queue = swapped;
            debug!("dma: {} head replaced", channel);
            return Ok(QueueSetup::Reconfigured);
        }

        if let Err(e) = build_chain(queue, dma, channel, node) {
            queue.reset();
            return Err(e);
        }
        dma.set_irq_enabled(channel, true);
        debug!("dma: {} chain built", channel);
        Ok(QueueSetup::Built)
    }

    /// Detach and clear the chain for `channel`.
    ///
    /// The chain is cleared even when the controller refuses to detach.
    /// Releasing an uninitialised chain is a no-op.
    pub fn release<D>(&mut self, dma: &mut D, channel: DmaChannel) -> Result<(), QueueError>
    where
        D: DmaController,
    {
        let queue = &mut self.queues[channel.index()];
        if !queue.is_initialized() {
            return Ok(());
        }
        dma.set_irq_enabled(channel, false);
        let unlinked = dma.unlink(channel).map_err(QueueError::Link);
        queue.reset();
        debug!("dma: {} chain released", channel);
        unlinked
    }
}

fn build_chain<D: DmaController>(
    queue: &mut DescriptorQueue,
    dma: &mut D,
    channel: DmaChannel,
    node: Descriptor,
) -> Result<(), QueueError> {
    queue.insert_tail(node)?;
    queue.set_circular()?;
    dma.link(channel, queue).map_err(QueueError::Link)
}

impl Default for DescriptorQueues {
    fn default() -> Self {
        Self::new()
    }
}
