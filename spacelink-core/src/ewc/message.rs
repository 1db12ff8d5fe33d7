//! EWC application message
//!
//! ```text
//! status[1] (signed) | dataSetCount[1] | data[dataSetCount × 4] (big-endian u32)
//! ```

use crate::constants::{EWC_MAX_DATA_COUNT, EWC_MESSAGE_PREFIX};
use crate::error::LinkError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Status code plus up to [`EWC_MAX_DATA_COUNT`] data words
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EwcMessage {
    /// Application status
    pub status: i8,
    /// Data words
    pub data: heapless::Vec<u32, EWC_MAX_DATA_COUNT>,
}

impl EwcMessage {
    /// Build a message; fails when `data` has more than [`EWC_MAX_DATA_COUNT`] words
    pub fn new(status: i8, data: &[u32]) -> Result<Self, LinkError> {
        let data = heapless::Vec::from_slice(data).map_err(|_| {
            LinkError::InvalidArgument(format!(
                "{} data words exceed the maximum of {}",
                data.len(),
                EWC_MAX_DATA_COUNT
            ))
        })?;
        Ok(Self { status, data })
    }

    /// Parse message bytes.
    ///
    /// The data set count must not exceed [`EWC_MAX_DATA_COUNT`] and the
    /// byte length must be exactly `2 + 4 × count`.
    pub fn parse(bytes: &[u8]) -> Result<Self, LinkError> {
        if bytes.len() < EWC_MESSAGE_PREFIX {
            return Err(LinkError::InvalidArgument(format!(
                "message of {} bytes is shorter than its prefix",
                bytes.len()
            )));
        }

        let mut buf = bytes;
        let status = buf.get_i8();
        let count = buf.get_u8() as usize;

        if count > EWC_MAX_DATA_COUNT {
            return Err(LinkError::InvalidArgument(format!(
                "data set count {} exceeds {}",
                count, EWC_MAX_DATA_COUNT
            )));
        }
        if buf.remaining() != count * 4 {
            return Err(LinkError::InvalidArgument(format!(
                "data set count {} does not match {} data bytes",
                count,
                buf.remaining()
            )));
        }

        let mut data = heapless::Vec::new();
        while buf.has_remaining() {
            // count was bounded above
            let _ = data.push(buf.get_u32());
        }
        Ok(Self { status, data })
    }

    /// Number of data words
    pub fn data_set_count(&self) -> u8 {
        self.data.len() as u8
    }

    /// Size of the encoded message
    pub fn encoded_len(&self) -> usize {
        EWC_MESSAGE_PREFIX + self.data.len() * 4
    }

    /// Append the encoded message to `buf`
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_i8(self.status);
        buf.put_u8(self.data_set_count());
        for word in &self.data {
            buf.put_u32(*word);
        }
    }

    /// Encoded message
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let msg = EwcMessage::new(-2, &[0x01020304, 0xAABBCCDD]).unwrap();
        assert_eq!(hex::encode(msg.to_bytes()), "fe0201020304aabbccdd");
        assert_eq!(msg.encoded_len(), 10);
    }

    #[test]
    fn test_parse() {
        let msg = EwcMessage::parse(&[0x05, 0x01, 0x00, 0x00, 0x01, 0x00]).unwrap();
        assert_eq!(msg.status, 5);
        assert_eq!(msg.data.as_slice(), &[256]);
    }

    #[test]
    fn test_parse_empty_data() {
        let msg = EwcMessage::parse(&[0x80, 0x00]).unwrap();
        assert_eq!(msg.status, -128);
        assert!(msg.data.is_empty());
    }

    #[test]
    fn test_too_many_words() {
        let words = [0u32; EWC_MAX_DATA_COUNT + 1];
        assert!(EwcMessage::new(0, &words).is_err());
        assert!(EwcMessage::new(0, &words[..EWC_MAX_DATA_COUNT]).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_count() {
        let mut bytes = vec![0u8, 21];
        bytes.extend(std::iter::repeat(0).take(84));
        assert!(EwcMessage::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_rejects_length_mismatch() {
        assert!(EwcMessage::parse(&[0, 2, 0, 0, 0, 1]).is_err());
        assert!(EwcMessage::parse(&[0, 0, 1]).is_err());
        assert!(EwcMessage::parse(&[0]).is_err());
    }

    #[test]
    fn test_serde() {
        let msg = EwcMessage::new(3, &[7, 8]).unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"status":3,"data":[7,8]}"#);
        assert_eq!(serde_json::from_str::<EwcMessage>(&json).unwrap(), msg);
    }
}
