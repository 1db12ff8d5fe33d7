//! MS200 frame encoding and the MS200 next hop

use super::Ms200Header;
use crate::constants::{MS200_HEADER_SIZE, MS200_MAX_PAYLOAD, MS200_SYNC_WORD};
use crate::encoder::{FrameParts, TxChannel};
use crate::error::{LinkError, TransmitError};
use crate::interface::{LinkDriver, NextHop, Route};
use crate::packet::{Packet, PacketMeta};
use crate::types::SequenceWord;
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

/// Sync marker and header for a payload of `payload_len` bytes
fn encode_head(
    meta: &PacketMeta,
    payload_len: usize,
    sequence: SequenceWord,
) -> Result<BytesMut, LinkError> {
    if payload_len > MS200_MAX_PAYLOAD {
        return Err(LinkError::InvalidArgument(format!(
            "payload of {} bytes does not fit the length field",
            payload_len
        )));
    }

    let mut buf = BytesMut::with_capacity(MS200_SYNC_WORD.len() + MS200_HEADER_SIZE + payload_len);
    buf.put_slice(MS200_SYNC_WORD);
    Ms200Header::new(meta, sequence, payload_len as u16).write(&mut buf);
    Ok(buf)
}

/// Encode a complete MS200 frame
///
/// The frame is encoded with the following layout:
/// 1. Sync marker (4 bytes): 1A CF FC 1D
/// 2. Stream id (2 bytes, big-endian)
/// 3. Sequence word (2 bytes, big-endian)
/// 4. Payload length (2 bytes, big-endian)
/// 5. Secondary header (9 bytes): src, dst, sport, 6 reserved
/// 6. Payload
pub fn encode_frame(
    meta: &PacketMeta,
    payload: &[u8],
    sequence: SequenceWord,
) -> Result<Bytes, LinkError> {
    let mut buf = encode_head(meta, payload.len(), sequence)?;
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// MS200 next hop: frames packets and writes them to a driver
#[derive(Debug)]
pub struct Ms200Link<D> {
    tx: TxChannel<D>,
}

impl<D: LinkDriver> Ms200Link<D> {
    /// Wrap a driver
    pub fn new(driver: D) -> Self {
        Self {
            tx: TxChannel::new(driver),
        }
    }

    /// Change how long a transmit waits for the link before giving up as busy
    pub fn with_lock_timeout(self, timeout: Duration) -> Self {
        Self {
            tx: self.tx.with_lock_timeout(timeout),
        }
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        self.tx.driver()
    }
}

impl<D: LinkDriver> NextHop for Ms200Link<D> {
    fn transmit(&self, route: &Route, packet: Packet) -> Result<(), TransmitError> {
        self.tx.transmit(route, packet, |packet, sequence| {
            let head = encode_head(&packet.meta, packet.len(), sequence)?;
            Ok(FrameParts {
                head: head.freeze(),
                tail: Bytes::new(),
            })
        })
    }
}
