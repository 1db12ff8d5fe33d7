//! EWC receive state machine
//!
//! Works like the MS200 decoder with two extra phases for the trace and the
//! separator. Every byte after the sync marker is kept in a fixed scratch
//! buffer until the CRC trailer has been checked; only then is the message
//! copied into the packet.

use super::{EwcHeader, EwcMessage};
use crate::constants::{
    CRC16_SIZE, EWC_HEADER_SIZE, EWC_MAX_MESSAGE_LEN, EWC_MAX_TRACE_LEN, EWC_MESSAGE_PREFIX,
    EWC_SCRATCH_CAPACITY, EWC_SEPARATOR, EWC_SYNC_WORD,
};
use crate::crc::crc16;
use crate::decoder::{AddressFilter, RxMode, RxPort};
use crate::error::LinkError;
use crate::interface::Interface;
use crate::packet::{BufferPool, Packet};
use crate::queue::IngressQueue;
use crate::sync::SyncMatcher;
use crate::types::ExecutionContext;
use std::mem;
use std::sync::Arc;

/// Outcome of the last completed EWC frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveStatus {
    /// CRC matched
    Success,
    /// CRC mismatch; the frame was discarded
    CrcError,
}

#[derive(Debug)]
enum RxState {
    NotStarted,
    NewStarted {
        sync: SyncMatcher,
    },
    /// `None` until the trace length byte has been read
    TraceStarted {
        remaining: Option<usize>,
    },
    Separator,
    HeaderStarted {
        start: usize,
    },
    Started {
        header: EwcHeader,
        message_start: usize,
        packet: Packet,
    },
    SkipFrame {
        sync: SyncMatcher,
    },
}

/// Reassembles and verifies EWC frames from a byte stream
#[derive(Debug)]
pub struct EwcDecoder {
    port: RxPort,
    filter: AddressFilter,
    state: RxState,
    scratch: [u8; EWC_SCRATCH_CAPACITY],
    scratch_len: usize,
    last_status: Option<ReceiveStatus>,
    last_message: Option<EwcMessage>,
}

impl EwcDecoder {
    /// Decoder for `iface`, taking buffers from `pool` and delivering to `queue`.
    ///
    /// `max_rx_length` caps accepted messages; zero means the buffer size.
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
            scratch: [0u8; EWC_SCRATCH_CAPACITY],
            scratch_len: 0,
            last_status: None,
            last_message: None,
        }
    }

    /// The interface this decoder receives for
    pub fn iface(&self) -> &Arc<Interface> {
        &self.port.iface
    }

    /// Largest message accepted
    pub fn max_rx_length(&self) -> usize {
        self.port.max_rx_length.min(EWC_MAX_MESSAGE_LEN)
    }

    /// Current address filter
    pub fn filter(&self) -> AddressFilter {
        self.filter
    }

    /// Set the host/node address filter; [`LinkError::Busy`] mid-frame
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
            RxState::TraceStarted { .. } => RxMode::TraceStarted,
            RxState::Separator => RxMode::Separator,
            RxState::HeaderStarted { .. } => RxMode::HeaderStarted,
            RxState::Started { .. } => RxMode::Started,
            RxState::SkipFrame { .. } => RxMode::SkipFrame,
        }
    }

    /// CRC verdict of the last frame that reached its trailer
    pub fn last_status(&self) -> Option<ReceiveStatus> {
        self.last_status
    }

    /// Last message that passed the CRC check and parsed
    pub fn last_message(&self) -> Option<&EwcMessage> {
        self.last_message.as_ref()
    }

    /// Abandon any partial frame, releasing its buffer
    pub fn reset(&mut self) {
        self.state = RxState::NotStarted;
        self.scratch_len = 0;
    }

    /// Process received bytes from an interrupt handler
    pub fn feed_from_isr(&mut self, bytes: &[u8]) {
        self.feed(bytes, ExecutionContext::Interrupt)
    }

    /// Process received bytes; see [`Ms200Decoder::feed`](crate::ms200::Ms200Decoder::feed)
    pub fn feed(&mut self, bytes: &[u8], ctx: ExecutionContext) {
        if ctx.is_interrupt() {
            self.port.iface.stats().record_irq();
        }
        self.consume(bytes, ctx);
    }

    fn consume(&mut self, bytes: &[u8], ctx: ExecutionContext) {
        let mut rest = bytes;
        while !rest.is_empty() {
            if let RxState::Started {
                header,
                message_start,
                ..
            } = &self.state
            {
                let end = *message_start + header.length as usize + CRC16_SIZE;
                let take = (end - self.scratch_len).min(rest.len());
                self.scratch[self.scratch_len..self.scratch_len + take]
                    .copy_from_slice(&rest[..take]);
                self.scratch_len += take;
                rest = &rest[take..];
                if self.scratch_len == end {
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

    /// Resume hunting one byte past a rejected sync marker.
    ///
    /// Everything taken since that marker is replayed, so a frame that
    /// starts inside a false frame's trace or header is still found.
    fn resync(&mut self, ctx: ExecutionContext) -> RxState {
        let consumed = self.scratch;
        let len = self.scratch_len;
        self.scratch_len = 0;
        self.state = skip();
        self.consume(&consumed[..len], ctx);
        mem::replace(&mut self.state, RxState::NotStarted)
    }

    fn push(&mut self, byte: u8) {
        self.scratch[self.scratch_len] = byte;
        self.scratch_len += 1;
    }

    fn step(&mut self, state: RxState, byte: u8, ctx: ExecutionContext) -> RxState {
        match state {
            RxState::NotStarted => self.hunt(SyncMatcher::new(EWC_SYNC_WORD), byte, false),
            RxState::NewStarted { sync } => self.hunt(sync, byte, false),
            RxState::SkipFrame { sync } => self.hunt(sync, byte, true),
            RxState::TraceStarted { remaining: None } => {
                self.push(byte);
                match byte as usize {
                    0 => RxState::Separator,
                    len if len <= EWC_MAX_TRACE_LEN => RxState::TraceStarted {
                        remaining: Some(len),
                    },
                    _ => {
                        self.port.frame_error("trace length out of range");
                        self.resync(ctx)
                    }
                }
            }
            RxState::TraceStarted {
                remaining: Some(remaining),
            } => {
                self.push(byte);
                if remaining > 1 {
                    RxState::TraceStarted {
                        remaining: Some(remaining - 1),
                    }
                } else {
                    RxState::Separator
                }
            }
            RxState::Separator => {
                self.push(byte);
                if byte != EWC_SEPARATOR {
                    self.port.frame_error("missing separator");
                    return self.resync(ctx);
                }
                RxState::HeaderStarted {
                    start: self.scratch_len,
                }
            }
            RxState::HeaderStarted { start } => {
                self.push(byte);
                if self.scratch_len - start < EWC_HEADER_SIZE {
                    return RxState::HeaderStarted { start };
                }
                let mut raw = [0u8; EWC_HEADER_SIZE];
                raw.copy_from_slice(&self.scratch[start..self.scratch_len]);
                self.begin_message(EwcHeader::parse(&raw), ctx)
            }
            started @ RxState::Started { .. } => started,
        }
    }

    fn hunt(&mut self, mut sync: SyncMatcher, byte: u8, skipping: bool) -> RxState {
        if sync.push(byte) {
            self.scratch_len = 0;
            RxState::TraceStarted { remaining: None }
        } else if skipping {
            RxState::SkipFrame { sync }
        } else if sync.matched() > 0 {
            RxState::NewStarted { sync }
        } else {
            RxState::NotStarted
        }
    }

    fn begin_message(&mut self, header: EwcHeader, ctx: ExecutionContext) -> RxState {
        let length = header.length as usize;

        if length < EWC_MESSAGE_PREFIX || length > self.max_rx_length() {
            self.port.frame_error("declared length out of range");
            return self.resync(ctx);
        }
        if !header.sequence.is_complete() {
            self.port.rx_error("unsupported segmentation flags");
            return self.resync(ctx);
        }
        let Some(mut packet) = self.port.acquire() else {
            return skip();
        };
        packet.meta = header.meta();

        RxState::Started {
            header,
            message_start: self.scratch_len,
            packet,
        }
    }

    fn complete(&mut self, ctx: ExecutionContext) {
        let RxState::Started {
            message_start,
            mut packet,
            ..
        } = mem::replace(&mut self.state, RxState::NotStarted)
        else {
            return;
        };

        let crc_at = self.scratch_len - CRC16_SIZE;
        let expected = u16::from_be_bytes([self.scratch[crc_at], self.scratch[crc_at + 1]]);
        let actual = crc16(&self.scratch[..crc_at]);

        if expected != actual {
            self.last_status = Some(ReceiveStatus::CrcError);
            self.port.frame_error(&LinkError::Crc { expected, actual }.to_string());
            drop(packet);
            self.state = self.resync(ctx);
            return;
        }
        self.last_status = Some(ReceiveStatus::Success);
        self.scratch_len = 0;

        let message_bytes = &self.scratch[message_start..crc_at];
        let message = match EwcMessage::parse(message_bytes) {
            Ok(message) => message,
            Err(error) => {
                self.port.rx_error(&error.to_string());
                return;
            }
        };

        if !packet.extend(message_bytes) {
            self.port.overflow(message_bytes.len());
            return;
        }
        self.last_message = Some(message);
        self.port.deliver(packet, &self.filter, ctx);
    }
}

fn skip() -> RxState {
    RxState::SkipFrame {
        sync: SyncMatcher::new(EWC_SYNC_WORD),
    }
}
