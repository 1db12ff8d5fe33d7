//! MS200 receive state machine
//!
//! Bytes may arrive one at a time from an interrupt handler or in chunks of
//! any size from a task; the outcome does not depend on the chunking. A
//! malformed frame sends the decoder to [`RxMode::SkipFrame`] until the next
//! sync marker, searched for from one byte past the rejected one, so it
//! always resynchronises on its own.

use super::Ms200Header;
use crate::constants::{MS200_HEADER_SIZE, MS200_SYNC_WORD};
use crate::decoder::{AddressFilter, RxMode, RxPort};
use crate::error::LinkError;
use crate::interface::Interface;
use crate::packet::{BufferPool, Packet};
use crate::queue::IngressQueue;
use crate::sync::SyncMatcher;
use crate::types::ExecutionContext;
use std::mem;
use std::sync::Arc;

#[derive(Debug)]
enum RxState {
    NotStarted,
    NewStarted {
        sync: SyncMatcher,
    },
    HeaderStarted {
        header: [u8; MS200_HEADER_SIZE],
        filled: usize,
    },
    Started {
        length: usize,
        packet: Packet,
    },
    SkipFrame {
        sync: SyncMatcher,
    },
}

/// Reassembles MS200 frames from a byte stream.
///
/// Holds at most one packet buffer at a time, while a payload is being
/// collected.
#[derive(Debug)]
pub struct Ms200Decoder {
    port: RxPort,
    filter: AddressFilter,
    state: RxState,
}

impl Ms200Decoder {
    /// Decoder for `iface`, taking buffers from `pool` and delivering to `queue`.
    ///
    /// `max_rx_length` caps accepted payloads; zero means the buffer size.
    pub fn new(
        iface: Arc<Interface>,
        pool: BufferPool,
        queue: IngressQueue,
        max_rx_length: usize,
    ) -> Self {
        Self {
            port: RxPort::new(iface, pool, queue, max_rx_length),
            filter: AddressFilter::default(),
            state: RxState::NotStarted,
        }
    }

    /// The interface this decoder receives for
    pub fn iface(&self) -> &Arc<Interface> {
        &self.port.iface
    }

    /// Largest payload accepted
    pub fn max_rx_length(&self) -> usize {
        self.port.max_rx_length
    }

    /// Current address filter
    pub fn filter(&self) -> AddressFilter {
        self.filter
    }

    /// Set the host/node address filter.
    ///
    /// Only allowed between frames; returns [`LinkError::Busy`] while a
    /// frame is partially received.
    pub fn set_config(&mut self, host_node: u8, node: u8) -> Result<(), LinkError> {
        if self.mode().is_mid_frame() {
            return Err(LinkError::Busy);
        }
        self.filter = AddressFilter::new(host_node, node);
        Ok(())
    }

    /// Current phase
    pub fn mode(&self) -> RxMode {
        match &self.state {
            RxState::NotStarted => RxMode::NotStarted,
            RxState::NewStarted { .. } => RxMode::NewStarted,
            RxState::HeaderStarted { .. } => RxMode::HeaderStarted,
            RxState::Started { .. } => RxMode::Started,
            RxState::SkipFrame { .. } => RxMode::SkipFrame,
        }
    }

    /// Abandon any partial frame, releasing its buffer
    pub fn reset(&mut self) {
        self.state = RxState::NotStarted;
    }

    /// Process received bytes from an interrupt handler
    pub fn feed_from_isr(&mut self, bytes: &[u8]) {
        self.feed(bytes, ExecutionContext::Interrupt)
    }

    /// Process received bytes.
    ///
    /// Completed packets go to the ingress queue; nothing is reported back.
    /// `ctx` must name the context the caller actually runs in.
    pub fn feed(&mut self, bytes: &[u8], ctx: ExecutionContext) {
        if ctx.is_interrupt() {
            self.port.iface.stats().record_irq();
        }

        let mut rest = bytes;
        while !rest.is_empty() {
            if let RxState::Started { length, packet } = &mut self.state {
                let take = (*length - packet.len()).min(rest.len());
                let copied = packet.extend(&rest[..take]);
                rest = &rest[take..];
                if !copied {
                    self.port.overflow(*length);
                    self.state = skip();
                } else if packet.len() == *length {
                    self.complete(ctx);
                }
                continue;
            }

            let byte = rest[0];
            rest = &rest[1..];
            let state = mem::replace(&mut self.state, RxState::NotStarted);
            self.state = self.step(state, byte, ctx);
        }
    }

    fn step(&mut self, state: RxState, byte: u8, ctx: ExecutionContext) -> RxState {
        match state {
            RxState::NotStarted => hunt(SyncMatcher::new(MS200_SYNC_WORD), byte, false),
            RxState::NewStarted { sync } => hunt(sync, byte, false),
            RxState::SkipFrame { sync } => hunt(sync, byte, true),
            RxState::HeaderStarted {
                mut header,
                mut filled,
            } => {
                header[filled] = byte;
                filled += 1;
                if filled < MS200_HEADER_SIZE {
                    RxState::HeaderStarted { header, filled }
                } else {
                    self.begin_payload(&header, ctx)
                }
            }
            // Payload bytes are consumed in bulk by `feed`
            started @ RxState::Started { .. } => started,
        }
    }

    fn begin_payload(
        &mut self,
        raw: &[u8; MS200_HEADER_SIZE],
        ctx: ExecutionContext,
    ) -> RxState {
        let header = Ms200Header::parse(raw);
        let length = header.length as usize;

        if !self.port.length_fits(length) {
            self.port.frame_error("declared length exceeds receive limit");
            return rescan(raw);
        }
        if !header.sequence.is_complete() {
            self.port.rx_error("unsupported segmentation flags");
            return rescan(raw);
        }
        let Some(mut packet) = self.port.acquire() else {
            return skip();
        };
        packet.meta = header.meta();

        if length == 0 {
            self.port.deliver(packet, &self.filter, ctx);
            return RxState::NotStarted;
        }
        RxState::Started { length, packet }
    }

    fn complete(&mut self, ctx: ExecutionContext) {
        if let RxState::Started { packet, .. } = mem::replace(&mut self.state, RxState::NotStarted)
        {
            self.port.deliver(packet, &self.filter, ctx);
        }
    }
}

fn skip() -> RxState {
    RxState::SkipFrame {
        sync: SyncMatcher::new(MS200_SYNC_WORD),
    }
}

/// Resume hunting one byte past a rejected sync marker.
///
/// The marker may have been a false one, with the real frame starting
/// inside the bytes taken as its header. A marker found there is at least
/// four bytes in, so the rest never fills a header.
fn rescan(consumed: &[u8]) -> RxState {
    consumed.iter().fold(skip(), |state, &byte| match state {
        RxState::SkipFrame { sync } => hunt(sync, byte, true),
        RxState::HeaderStarted { mut header, filled } => {
            header[filled] = byte;
            RxState::HeaderStarted {
                header,
                filled: filled + 1,
            }
        }
        other => other,
    })
}

fn hunt(mut sync: SyncMatcher, byte: u8, skipping: bool) -> RxState {
    if sync.push(byte) {
        RxState::HeaderStarted {
            header: [0u8; MS200_HEADER_SIZE],
            filled: 0,
        }
    } else if skipping {
        RxState::SkipFrame { sync }
    } else if sync.matched() > 0 {
        RxState::NewStarted { sync }
    } else {
        RxState::NotStarted
    }
}
