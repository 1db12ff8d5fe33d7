//! Constants and limits for the MS200 and EWC link layers

/// Max unique length of an interface name when matching names
pub const IFACE_NAME_MAX: usize = 10;

/// Size of the packet-level CRC32 that upper layers may append.
/// The default MTU leaves room for it.
pub const PACKET_CRC32_SIZE: usize = 4;

/// Destination node accepted by every address filter
pub const BROADCAST_NODE: u8 = 0xFF;

/// Segmentation flags value of a complete (unsegmented) packet
pub const SEGMENTATION_COMPLETE: u8 = 0b11;

/// Largest sequence count representable in the 14-bit field
pub const SEQUENCE_COUNT_MASK: u16 = 0x3FFF;

/// Largest application id representable in the 11-bit field
pub const APID_MASK: u16 = 0x07FF;

/// How long a transmit waits for the link lock before reporting busy
pub const TX_LOCK_TIMEOUT_MS: u64 = 1000;

// ---- MS200 ----

/// MS200 sync marker (CCSDS attached sync marker)
pub const MS200_SYNC_WORD: &[u8; 4] = b"\x1A\xCF\xFC\x1D";

/// Size of the MS200 secondary header
pub const MS200_SECONDARY_HEADER_SIZE: usize = 9;

/// MS200 header size following the sync marker:
/// 2 (stream id) + 2 (sequence) + 2 (length) + 9 (secondary header) = 15 bytes
pub const MS200_HEADER_SIZE: usize = 6 + MS200_SECONDARY_HEADER_SIZE;

/// Largest payload the MS200 length field can declare
pub const MS200_MAX_PAYLOAD: usize = u16::MAX as usize;

// ---- EWC ----

/// EWC sync marker
pub const EWC_SYNC_WORD: &[u8; 4] = b"\x35\x2E\xF8\x53";

/// Delimiter between the trace sub-frame and the EWC header
pub const EWC_SEPARATOR: u8 = 0x7C;

/// Longest diagnostic trace accepted in front of an EWC header
pub const EWC_MAX_TRACE_LEN: usize = 32;

/// EWC header size following the separator:
/// 1 (src) + 1 (dst) + 1 (sport) + 2 (stream id) + 2 (sequence) + 2 (length) = 9 bytes
pub const EWC_HEADER_SIZE: usize = 9;

/// Maximum number of data words in an EWC application message
pub const EWC_MAX_DATA_COUNT: usize = 20;

/// Status byte plus data-set count
pub const EWC_MESSAGE_PREFIX: usize = 2;

/// Largest EWC application message: 2 + 20 * 4 = 82 bytes
pub const EWC_MAX_MESSAGE_LEN: usize = EWC_MESSAGE_PREFIX + EWC_MAX_DATA_COUNT * 4;

/// Size of the CRC16 trailer
pub const CRC16_SIZE: usize = 2;

/// Raw bytes held pending CRC validation: everything after the sync marker
pub const EWC_SCRATCH_CAPACITY: usize = 128;

const _: () = assert!(
    1 + EWC_MAX_TRACE_LEN + 1 + EWC_HEADER_SIZE + EWC_MAX_MESSAGE_LEN + CRC16_SIZE
        <= EWC_SCRATCH_CAPACITY
);
