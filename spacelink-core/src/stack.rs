//! Shared resources of a node's link layer

use crate::config::StackConfig;
use crate::packet::BufferPool;
use crate::queue::IngressQueue;
use crate::registry::InterfaceRegistry;

/// Buffer pool, ingress queue and interface registry shared by every link
/// on a node.
///
/// Links are brought up with [`ms200::add_interface`](crate::ms200::add_interface)
/// or [`ewc::add_interface`](crate::ewc::add_interface); the router consumes
/// [`queue`](Self::queue).
#[derive(Debug)]
pub struct LinkStack {
    pool: BufferPool,
    queue: IngressQueue,
    registry: InterfaceRegistry,
}

impl LinkStack {
    /// Create the shared resources described by `config`
    pub fn new(config: &StackConfig) -> Self {
        Self {
            pool: BufferPool::new(config.pool_buffers, config.buffer_size),
            queue: IngressQueue::new(config.queue_depth),
            registry: InterfaceRegistry::new(config.buffer_size),
        }
    }

    /// Packet buffer pool
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Received packets waiting for the router
    pub fn queue(&self) -> &IngressQueue {
        &self.queue
    }

    /// Registered interfaces
    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }
}

impl Default for LinkStack {
    fn default() -> Self {
        Self::new(&StackConfig::default())
    }
}
