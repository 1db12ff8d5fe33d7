//! MS200 serial link (the simple framing)
//!
//! Frame layout, big-endian:
//!
//! ```text
//! sync[4] | streamId[2] | sequence[2] | length[2] | secondaryHeader[9] | payload[length]
//! ```
//!
//! The secondary header carries the source node, destination node and
//! sub-port in its first three bytes; the rest is reserved.

pub mod decoder;
pub mod encoder;

pub use decoder::Ms200Decoder;
pub use encoder::{encode_frame, Ms200Link};

use crate::config::LinkConfig;
use crate::constants::{MS200_HEADER_SIZE, MS200_SECONDARY_HEADER_SIZE};
use crate::error::LinkError;
use crate::interface::{Interface, LinkDriver};
use crate::packet::PacketMeta;
use crate::stack::LinkStack;
use crate::types::{SequenceWord, StreamId};
use bytes::BufMut;
use std::sync::Arc;

/// Default name of the MS200 interface
pub const DEFAULT_NAME: &str = "MS200";

/// Parsed MS200 header (everything between sync marker and payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ms200Header {
    /// Packet identifier word
    pub stream_id: StreamId,
    /// Sequence word
    pub sequence: SequenceWord,
    /// Payload length in bytes
    pub length: u16,
    /// Secondary header
    pub secondary: [u8; MS200_SECONDARY_HEADER_SIZE],
}

impl Ms200Header {
    /// Header for a complete packet described by `meta`
    pub fn new(meta: &PacketMeta, sequence: SequenceWord, length: u16) -> Self {
        let mut secondary = [0u8; MS200_SECONDARY_HEADER_SIZE];
        secondary[0] = meta.src;
        secondary[1] = meta.dst;
        secondary[2] = meta.sport;
        Self {
            stream_id: StreamId::new(meta.apid, meta.packet_type, true),
            sequence,
            length,
            secondary,
        }
    }

    /// Parse header bytes
    pub fn parse(bytes: &[u8; MS200_HEADER_SIZE]) -> Self {
        let mut secondary = [0u8; MS200_SECONDARY_HEADER_SIZE];
        secondary.copy_from_slice(&bytes[6..]);
        Self {
            stream_id: StreamId::from_raw(u16::from_be_bytes([bytes[0], bytes[1]])),
            sequence: SequenceWord::from_raw(u16::from_be_bytes([bytes[2], bytes[3]])),
            length: u16::from_be_bytes([bytes[4], bytes[5]]),
            secondary,
        }
    }

    /// Append the header to `buf`
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.stream_id.as_u16());
        buf.put_u16(self.sequence.as_u16());
        buf.put_u16(self.length);
        buf.put_slice(&self.secondary);
    }

    /// Packet metadata carried by this header
    pub fn meta(&self) -> PacketMeta {
        PacketMeta {
            src: self.secondary[0],
            dst: self.secondary[1],
            sport: self.secondary[2],
            apid: self.stream_id.apid(),
            packet_type: self.stream_id.packet_type(),
            sequence: self.sequence.count(),
        }
    }
}

/// Bring up an MS200 interface on `stack`.
///
/// Registers the interface (the MTU defaults as described on
/// [`InterfaceRegistry::register`](crate::registry::InterfaceRegistry::register))
/// with an [`Ms200Link`] around `driver` as its next hop, and returns the
/// decoder the driver must feed received bytes into.
pub fn add_interface<D>(
    stack: &LinkStack,
    driver: D,
    config: &LinkConfig,
) -> Result<(Arc<Interface>, Ms200Decoder), LinkError>
where
    D: LinkDriver + 'static,
{
    let link = Arc::new(Ms200Link::new(driver));
    let builder = Interface::builder(config.name_or(DEFAULT_NAME), link)
        .mtu(config.mtu)
        .split_horizon_off(config.split_horizon_off);
    let iface = stack.registry().register(builder)?;

    let mut decoder = Ms200Decoder::new(
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
            src: 1,
            dst: 2,
            sport: 3,
            apid: 0x42,
            packet_type: PacketType::Command,
            sequence: 0,
        };
        let header = Ms200Header::new(&meta, SequenceWord::complete(9), 300);

        let mut buf = BytesMut::new();
        header.write(&mut buf);
        assert_eq!(buf.len(), MS200_HEADER_SIZE);
        assert_eq!(&buf[..6], &[0x18, 0x42, 0xC0, 0x09, 0x01, 0x2C]);
        assert_eq!(&buf[6..9], &[1, 2, 3]);

        let mut raw = [0u8; MS200_HEADER_SIZE];
        raw.copy_from_slice(&buf);
        let parsed = Ms200Header::parse(&raw);
        assert_eq!(parsed, header);
        assert_eq!(
            parsed.meta(),
            PacketMeta {
                sequence: 9,
                ..meta
            }
        );
    }
}
