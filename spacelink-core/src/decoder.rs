//! Pieces shared by the MS200 and EWC frame decoders

use crate::interface::Interface;
use crate::packet::{BufferPool, Packet};
use crate::queue::IngressQueue;
use crate::types::ExecutionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Decoder phase, as reported by [`mode`](crate::ms200::Ms200Decoder::mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxMode {
    /// No start detected
    NotStarted,
    /// Part of a sync marker seen
    NewStarted,
    /// Collecting header bytes
    HeaderStarted,
    /// Consuming a diagnostic trace (EWC)
    TraceStarted,
    /// Expecting the trace/header delimiter (EWC)
    Separator,
    /// Collecting payload bytes
    Started,
    /// Discarding bytes until the next sync marker
    SkipFrame,
}

impl RxMode {
    /// True while part of a frame has been consumed
    pub const fn is_mid_frame(&self) -> bool {
        matches!(
            self,
            RxMode::HeaderStarted | RxMode::TraceStarted | RxMode::Separator | RxMode::Started
        )
    }
}

/// Node-address filter applied to every completed frame.
///
/// Zero means unset: `node == 0` accepts every destination and
/// `host_node == 0` accepts every source. Frames to
/// [`BROADCAST_NODE`](crate::constants::BROADCAST_NODE) are always accepted
/// by the destination check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressFilter {
    /// Node frames must come from
    pub host_node: u8,
    /// This node
    pub node: u8,
}

impl AddressFilter {
    /// Filter for the given host and node
    pub const fn new(host_node: u8, node: u8) -> Self {
        Self { host_node, node }
    }

    /// Whether a frame from `src` to `dst` is for us
    pub const fn accepts(&self, src: u8, dst: u8) -> bool {
        let dst_ok =
            self.node == 0 || dst == self.node || dst == crate::constants::BROADCAST_NODE;
        let src_ok = self.host_node == 0 || src == self.host_node;
        dst_ok && src_ok
    }
}

/// Where a decoder gets buffers from and delivers packets to
#[derive(Debug, Clone)]
pub(crate) struct RxPort {
    pub(crate) iface: Arc<Interface>,
    pub(crate) pool: BufferPool,
    pub(crate) queue: IngressQueue,
    pub(crate) max_rx_length: usize,
}

impl RxPort {
    pub(crate) fn new(
        iface: Arc<Interface>,
        pool: BufferPool,
        queue: IngressQueue,
        max_rx_length: usize,
    ) -> Self {
        let max_rx_length = if max_rx_length == 0 {
            pool.data_size()
        } else {
            max_rx_length.min(pool.data_size())
        };
        Self {
            iface,
            pool,
            queue,
            max_rx_length,
        }
    }

    /// Whether a declared payload length fits both the buffers and the
    /// configured receive limit
    pub(crate) fn length_fits(&self, len: usize) -> bool {
        len <= self.max_rx_length
    }

    /// Get a buffer for a new frame; counts a drop when the pool is empty
    pub(crate) fn acquire(&self) -> Option<Packet> {
        let packet = self.pool.get();
        if packet.is_none() {
            #[cfg(feature = "logging")]
            warn!("{}: no packet buffer, skipping frame", self.iface.name());
            self.iface.stats().record_drop();
        }
        packet
    }

    /// Filter a completed packet and hand it to the ingress queue
    pub(crate) fn deliver(&self, packet: Packet, filter: &AddressFilter, ctx: ExecutionContext) {
        if !filter.accepts(packet.meta.src, packet.meta.dst) {
            #[cfg(feature = "logging")]
            debug!(
                "{}: dropping packet {} -> {} (not for us)",
                self.iface.name(),
                packet.meta.src,
                packet.meta.dst
            );
            self.iface.stats().record_drop();
            return;
        }

        #[cfg(feature = "logging")]
        debug!(
            "{}: received {} byte packet (apid {}, seq {})",
            self.iface.name(),
            packet.len(),
            packet.meta.apid,
            packet.meta.sequence
        );

        self.queue.submit(packet, &self.iface, ctx);
    }

    /// A payload outgrew its buffer; counts a drop
    pub(crate) fn overflow(&self, _len: usize) {
        #[cfg(feature = "logging")]
        warn!(
            "{}: {} byte payload does not fit its buffer",
            self.iface.name(),
            _len
        );
        self.iface.stats().record_drop();
    }

    pub(crate) fn frame_error(&self, _what: &str) {
        #[cfg(feature = "logging")]
        warn!("{}: frame error: {}", self.iface.name(), _what);
        self.iface.stats().record_frame_error();
    }

    pub(crate) fn rx_error(&self, _what: &str) {
        #[cfg(feature = "logging")]
        warn!("{}: receive error: {}", self.iface.name(), _what);
        self.iface.stats().record_rx_error();
    }
}
