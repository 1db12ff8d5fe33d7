//! EWC frame encoding and the EWC next hop

use super::{EwcHeader, EwcMessage};
use crate::constants::{
    CRC16_SIZE, EWC_HEADER_SIZE, EWC_MAX_TRACE_LEN, EWC_SEPARATOR, EWC_SYNC_WORD,
};
use crate::crc::Crc16Digest;
use crate::encoder::{FrameParts, TxChannel};
use crate::error::{LinkError, TransmitError};
use crate::interface::{LinkDriver, NextHop, Route};
use crate::packet::{Packet, PacketMeta};
use crate::types::SequenceWord;
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

/// Sync marker through header, ready for the message
fn encode_head(
    meta: &PacketMeta,
    trace: &[u8],
    message: &[u8],
    sequence: SequenceWord,
) -> Result<BytesMut, LinkError> {
    if trace.len() > EWC_MAX_TRACE_LEN {
        return Err(LinkError::InvalidArgument(format!(
            "trace of {} bytes exceeds {}",
            trace.len(),
            EWC_MAX_TRACE_LEN
        )));
    }
    EwcMessage::parse(message)?;

    let mut buf = BytesMut::with_capacity(
        EWC_SYNC_WORD.len() + 2 + trace.len() + EWC_HEADER_SIZE + message.len() + CRC16_SIZE,
    );
    buf.put_slice(EWC_SYNC_WORD);
    buf.put_u8(trace.len() as u8);
    buf.put_slice(trace);
    buf.put_u8(EWC_SEPARATOR);
    EwcHeader::new(meta, sequence, message.len() as u16).write(&mut buf);
    Ok(buf)
}

/// CRC trailer over everything after the sync marker
fn encode_tail(head: &[u8], message: &[u8]) -> Bytes {
    let mut digest = Crc16Digest::new();
    digest.update(&head[EWC_SYNC_WORD.len()..]);
    digest.update(message);
    Bytes::copy_from_slice(&digest.finalize().to_be_bytes())
}

/// Encode a complete EWC frame with an empty trace.
///
/// `message` must be a well-formed [`EwcMessage`].
pub fn encode_frame(
    meta: &PacketMeta,
    message: &[u8],
    sequence: SequenceWord,
) -> Result<Bytes, LinkError> {
    encode_frame_with_trace(meta, &[], message, sequence)
}

/// Encode a complete EWC frame carrying a diagnostic trace of up to
/// [`EWC_MAX_TRACE_LEN`] bytes
pub fn encode_frame_with_trace(
    meta: &PacketMeta,
    trace: &[u8],
    message: &[u8],
    sequence: SequenceWord,
) -> Result<Bytes, LinkError> {
    let mut buf = encode_head(meta, trace, message, sequence)?;
    let tail = encode_tail(&buf, message);
    buf.put_slice(message);
    buf.put_slice(&tail);
    Ok(buf.freeze())
}

/// EWC next hop: frames packets (whose payload is an encoded
/// [`EwcMessage`]) and writes them to a driver
#[derive(Debug)]
pub struct EwcLink<D> {
    tx: TxChannel<D>,
}

impl<D: LinkDriver> EwcLink<D> {
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

impl<D: LinkDriver> NextHop for EwcLink<D> {
    fn transmit(&self, route: &Route, packet: Packet) -> Result<(), TransmitError> {
        self.tx.transmit(route, packet, |packet, sequence| {
            let head = encode_head(&packet.meta, &[], packet.payload(), sequence)?;
            let tail = encode_tail(&head, packet.payload());
            Ok(FrameParts {
                head: head.freeze(),
                tail,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16;

    fn meta() -> PacketMeta {
        PacketMeta {
            src: 1,
            dst: 2,
            sport: 3,
            apid: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_frame_layout() {
        let message = EwcMessage::new(1, &[0xDEADBEEF]).unwrap().to_bytes();
        let frame = encode_frame(&meta(), &message, SequenceWord::complete(2)).unwrap();

        assert_eq!(&frame[..4], EWC_SYNC_WORD);
        assert_eq!(frame[4], 0);
        assert_eq!(frame[5], EWC_SEPARATOR);
        assert_eq!(&frame[6..9], &[1, 2, 3]);
        assert_eq!(&frame[13..15], &6u16.to_be_bytes());
        assert_eq!(&frame[15..21], &message[..]);
        assert_eq!(frame.len(), 4 + 2 + EWC_HEADER_SIZE + 6 + CRC16_SIZE);

        let crc = crc16(&frame[4..21]);
        assert_eq!(&frame[21..], &crc.to_be_bytes());
    }

    #[test]
    fn test_trace_is_covered_by_crc() {
        let message = EwcMessage::new(0, &[]).unwrap().to_bytes();
        let frame =
            encode_frame_with_trace(&meta(), b"diag", &message, SequenceWord::complete(0)).unwrap();

        assert_eq!(frame[4], 4);
        assert_eq!(&frame[5..9], b"diag");
        assert_eq!(frame[9], EWC_SEPARATOR);
        let body = &frame[4..frame.len() - 2];
        assert_eq!(&frame[frame.len() - 2..], &crc16(body).to_be_bytes());
    }

    #[test]
    fn test_rejects_long_trace() {
        let message = EwcMessage::default().to_bytes();
        let trace = [0u8; EWC_MAX_TRACE_LEN + 1];
        let result =
            encode_frame_with_trace(&meta(), &trace, &message, SequenceWord::complete(0));
        assert!(matches!(result, Err(LinkError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_malformed_message() {
        let result = encode_frame(&meta(), &[0, 1, 2], SequenceWord::complete(0));
        assert!(matches!(result, Err(LinkError::InvalidArgument(_))));
    }
}
