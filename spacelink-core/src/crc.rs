//! CRC16 used to gate EWC frames
//!
//! CRC-16/CCITT-FALSE: polynomial 0x1021, initial value 0xFFFF, no
//! reflection, no final xor.

use crc::{Crc, CRC_16_IBM_3740};

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the CRC16 of `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Compute the CRC16 of the first `len` bytes of `data`.
///
/// `len` is clamped to the slice length.
pub fn crc16_memory(data: &[u8], len: usize) -> u16 {
    crc16(&data[..len.min(data.len())])
}

/// Incremental CRC16 for data that arrives in pieces
pub struct Crc16Digest {
    digest: crc::Digest<'static, u16>,
}

impl Crc16Digest {
    /// Start a new checksum
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
        }
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Finish and return the checksum
    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16Digest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_empty_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_memory_clamps_length() {
        let data = b"123456789";
        assert_eq!(crc16_memory(data, 100), crc16(data));
        assert_eq!(crc16_memory(data, 4), crc16(b"1234"));
        assert_eq!(crc16_memory(data, 0), crc16(&[]));
    }

    #[test]
    fn test_digest_matches_oneshot() {
        let mut digest = Crc16Digest::new();
        digest.update(b"1234");
        digest.update(b"56789");
        assert_eq!(digest.finalize(), 0x29B1);
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let data: Vec<u8> = (0u8..64).collect();
        let reference = crc16(&data);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc16(&flipped), reference, "flip at {byte}:{bit}");
            }
        }
    }
}
