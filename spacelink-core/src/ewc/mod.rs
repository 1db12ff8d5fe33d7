//! EWC serial link (the rich framing)
//!
//! Frame layout, big-endian:
//!
//! ```text
//! sync[4] | traceLen[1] | trace[traceLen] | 0x7C | src[1] | dst[1] | sport[1]
//!         | streamId[2] | sequence[2] | length[2] | message[length] | crc16[2]
//! ```
//!
//! The trace is a diagnostic sub-frame that receivers skip. The CRC16 covers
//! everything after the sync marker up to the end of the message, and the
//! message itself is an [`EwcMessage`].

pub mod decoder;
pub mod encoder;
pub mod message;

pub use decoder::{EwcDecoder, ReceiveStatus};
pub use encoder::{encode_frame, encode_frame_with_trace, EwcLink};
pub use message::EwcMessage;

use crate::config::LinkConfig;
use crate::constants::EWC_HEADER_SIZE;
use crate::error::LinkError;
use crate::interface::{Interface, LinkDriver};
use crate::packet::PacketMeta;
use crate::stack::LinkStack;
use crate::types::{SequenceWord, StreamId};
use bytes::BufMut;
use std::sync::Arc;

/// Default name of the EWC interface
pub const DEFAULT_NAME: &str = "EWC";

/// Parsed EWC header (the fields between separator and message)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EwcHeader {
    /// Source node
    pub src: u8,
    /// Destination node
    pub dst: u8,
    /// Sub-port
    pub sport: u8,
    /// Packet identifier word
    pub stream_id: StreamId,
    /// Sequence word
    pub sequence: SequenceWord,
    /// Message length in bytes
    pub length: u16,
}

impl EwcHeader {
    /// Header for a complete packet described by `meta`
    pub fn new(meta: &PacketMeta, sequence: SequenceWord, length: u16) -> Self {
        Self {
            src: meta.src,
            dst: meta.dst,
            sport: meta.sport,
            stream_id: StreamId::new(meta.apid, meta.packet_type, false),
            sequence,
            length,
        }
    }

    /// Parse header bytes
    pub fn parse(bytes: &[u8; EWC_HEADER_SIZE]) -> Self {
        Self {
            src: bytes[0],
            dst: bytes[1],
            sport: bytes[2],
            stream_id: StreamId::from_raw(u16::from_be_bytes([bytes[3], bytes[4]])),
            sequence: SequenceWord::from_raw(u16::from_be_bytes([bytes[5], bytes[6]])),
            length: u16::from_be_bytes([bytes[7], bytes[8]]),
        }
    }

    /// Append the header to `buf`
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.src);
        buf.put_u8(self.dst);
        buf.put_u8(self.sport);
        buf.put_u16(self.stream_id.as_u16());
        buf.put_u16(self.sequence.as_u16());
        buf.put_u16(self.length);
    }

    /// Packet metadata carried by this header
    pub fn meta(&self) -> PacketMeta {
        PacketMeta {
            src: self.src,
            dst: self.dst,
            sport: self.sport,
            apid: self.stream_id.apid(),
            packet_type: self.stream_id.packet_type(),
            sequence: self.sequence.count(),
        }
    }
}

/// Bring up an EWC interface on `stack`.
///
/// Same as [`ms200::add_interface`](crate::ms200::add_interface) with an
/// [`EwcLink`] as next hop and an [`EwcDecoder`] for reception.
pub fn add_interface<D>(
    stack: &LinkStack,
    driver: D,
    config: &LinkConfig,
) -> Result<(Arc<Interface>, EwcDecoder), LinkError>
where
    D: LinkDriver + 'static,
{
    let link = Arc::new(EwcLink::new(driver));
    let builder = Interface::builder(config.name_or(DEFAULT_NAME), link)
        .mtu(config.mtu)
        .split_horizon_off(config.split_horizon_off);
    let iface = stack.registry().register(builder)?;

    let mut decoder = EwcDecoder::new(
        Arc::clone(&iface),
        stack.pool().clone(),
        stack.queue().clone(),
        config.max_rx_length,
    );
    decoder.set_config(config.host_node, config.node)?;

    Ok((iface, decoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PacketType;
    use bytes::BytesMut;

    #[test]
    fn test_header_layout() {
        let meta = PacketMeta {
            src: 4,
            dst: 9,
            sport: 2,
            apid: 0x123,
            packet_type: PacketType::Telemetry,
            sequence: 0,
        };
        let header = EwcHeader::new(&meta, SequenceWord::complete(0x100), 10);

        let mut buf = BytesMut::new();
        header.write(&mut buf);
        assert_eq!(hex::encode(&buf), "0409020123c100000a");

        let mut raw = [0u8; EWC_HEADER_SIZE];
        raw.copy_from_slice(&buf);
        let parsed = EwcHeader::parse(&raw);
        assert_eq!(parsed, header);
        assert_eq!(parsed.meta().sport, 2);
        assert_eq!(parsed.meta().sequence, 0x100);
        assert!(!parsed.stream_id.has_secondary_header());
    }
}
