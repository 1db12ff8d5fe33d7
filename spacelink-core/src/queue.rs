//! Ingress queue: the hand-off from link-layer reception to the router
//!
//! Submission is fire-and-forget. A submitted packet is either queued for the
//! router or released on the spot, and the interface counters say which.
//!
//! Callers must state their execution context truthfully: interrupt-context
//! callers go through a path that never blocks, task-context callers may wait
//! briefly for the queue lock. Claiming task context from an interrupt
//! handler is a caller bug and is not detected here.

use crate::interface::Interface;
use crate::packet::Packet;
use crate::types::ExecutionContext;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A received packet together with the interface it arrived on
#[derive(Debug)]
pub struct Ingress {
    /// The packet
    pub packet: Packet,
    /// Incoming interface
    pub iface: Arc<Interface>,
}

#[derive(Debug)]
struct Shared {
    depth: usize,
    items: Mutex<VecDeque<Ingress>>,
    ready: Condvar,
}

/// Bounded multi-producer queue of received packets
#[derive(Debug, Clone)]
pub struct IngressQueue {
    shared: Arc<Shared>,
}

impl IngressQueue {
    /// Create a queue holding at most `depth` packets
    pub fn new(depth: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                depth,
                items: Mutex::new(VecDeque::with_capacity(depth)),
                ready: Condvar::new(),
            }),
        }
    }

    /// Hand a received packet to the router.
    ///
    /// On success `rx`/`rxbytes` of `iface` are incremented; otherwise the
    /// packet is released and `drop` is incremented.
    pub fn submit(&self, packet: Packet, iface: &Arc<Interface>, ctx: ExecutionContext) {
        let len = packet.len();
        let item = Ingress {
            packet,
            iface: Arc::clone(iface),
        };

        let queued = match ctx {
            ExecutionContext::Interrupt => self.push_nonblocking(item),
            ExecutionContext::Task => self.push_blocking(item),
        };

        match queued {
            Ok(()) => {
                iface.stats().record_rx(len);
                self.shared.ready.notify_one();
            }
            Err(rejected) => {
                #[cfg(feature = "logging")]
                warn!(
                    "Ingress queue full, dropping {} byte packet from {}",
                    len,
                    iface.name()
                );
                iface.stats().record_drop();
                drop(rejected);
            }
        }
    }

    /// [`submit`](Self::submit) from an interrupt handler
    pub fn submit_from_isr(&self, packet: Packet, iface: &Arc<Interface>) {
        self.submit(packet, iface, ExecutionContext::Interrupt)
    }

    /// [`submit`](Self::submit) from a task
    pub fn submit_from_task(&self, packet: Packet, iface: &Arc<Interface>) {
        self.submit(packet, iface, ExecutionContext::Task)
    }

    // A contended lock counts as full: an interrupt must not wait for it.
    fn push_nonblocking(&self, item: Ingress) -> Result<(), Ingress> {
        match self.shared.items.try_lock() {
            Some(mut items) => self.push_locked(&mut items, item),
            None => Err(item),
        }
    }

    fn push_blocking(&self, item: Ingress) -> Result<(), Ingress> {
        let mut items = self.shared.items.lock();
        self.push_locked(&mut items, item)
    }

    fn push_locked(&self, items: &mut VecDeque<Ingress>, item: Ingress) -> Result<(), Ingress> {
        if items.len() >= self.shared.depth {
            return Err(item);
        }
        items.push_back(item);
        Ok(())
    }

    /// Take the oldest packet, if any
    pub fn try_recv(&self) -> Option<Ingress> {
        self.shared.items.lock().pop_front()
    }

    /// Take the oldest packet, waiting up to `timeout` for one to arrive
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Ingress> {
        let deadline = Instant::now() + timeout;
        let mut items = self.shared.items.lock();
        // Wakeups may be spurious, or another consumer may get there first
        while items.is_empty() {
            let result = self.shared.ready.wait_until(&mut items, deadline);
            if result.timed_out() && items.is_empty() {
                return None;
            }
        }
        let item = items.pop_front();

        #[cfg(feature = "logging")]
        if let Some(ingress) = &item {
            debug!(
                "Routing {} byte packet from {}",
                ingress.packet.len(),
                ingress.iface.name()
            );
        }

        item
    }

    /// Take everything queued right now
    pub fn drain(&self) -> Vec<Ingress> {
        self.shared.items.lock().drain(..).collect()
    }

    /// Packets waiting
    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued packets
    pub fn depth(&self) -> usize {
        self.shared.depth
    }
}
