//! Header words shared by the MS200 and EWC frame layouts

use crate::constants::{APID_MASK, SEGMENTATION_COMPLETE, SEQUENCE_COUNT_MASK};
use serde::{Deserialize, Serialize};

/// Packet type bit of the stream id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PacketType {
    /// Telemetry (0)
    #[default]
    Telemetry,
    /// Command (1)
    Command,
}

/// Packet identifier word (stream id)
///
/// ```text
/// bits   shift  description
/// 0x07FF   0    application id
/// 0x0800  11    secondary header: 0 = absent, 1 = present
/// 0x1000  12    packet type:      0 = TLM, 1 = CMD
/// 0xE000  13    version
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamId(u16);

impl StreamId {
    const SECONDARY_HEADER: u16 = 0x0800;
    const PACKET_TYPE: u16 = 0x1000;
    const VERSION_SHIFT: u16 = 13;

    /// Create from the raw big-endian word
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Build a stream id from its fields; the application id is masked to 11 bits
    pub const fn new(apid: u16, packet_type: PacketType, secondary_header: bool) -> Self {
        let mut raw = apid & APID_MASK;
        if secondary_header {
            raw |= Self::SECONDARY_HEADER;
        }
        if let PacketType::Command = packet_type {
            raw |= Self::PACKET_TYPE;
        }
        Self(raw)
    }

    /// Raw word
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Application id
    pub const fn apid(&self) -> u16 {
        self.0 & APID_MASK
    }

    /// Whether a secondary header follows
    pub const fn has_secondary_header(&self) -> bool {
        (self.0 & Self::SECONDARY_HEADER) != 0
    }

    /// Telemetry or command
    pub const fn packet_type(&self) -> PacketType {
        if (self.0 & Self::PACKET_TYPE) != 0 {
            PacketType::Command
        } else {
            PacketType::Telemetry
        }
    }

    /// Version field (3 bits)
    pub const fn version(&self) -> u8 {
        (self.0 >> Self::VERSION_SHIFT) as u8
    }
}

/// Packet sequence word
///
/// ```text
/// bits   shift  description
/// 0x3FFF   0    sequence count
/// 0xC000  14    segmentation flags: 3 = complete packet
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceWord(u16);

impl SequenceWord {
    const FLAGS_SHIFT: u16 = 14;

    /// Create from the raw big-endian word
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Sequence word of a complete packet; the count wraps at 14 bits
    pub const fn complete(count: u16) -> Self {
        Self(((SEGMENTATION_COMPLETE as u16) << Self::FLAGS_SHIFT) | (count & SEQUENCE_COUNT_MASK))
    }

    /// Raw word
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Sequence count
    pub const fn count(&self) -> u16 {
        self.0 & SEQUENCE_COUNT_MASK
    }

    /// Segmentation flags (2 bits)
    pub const fn segmentation_flags(&self) -> u8 {
        (self.0 >> Self::FLAGS_SHIFT) as u8
    }

    /// Whether the frame carries a complete packet.
    ///
    /// Other segmentation values are not reassembled by this layer.
    pub const fn is_complete(&self) -> bool {
        self.segmentation_flags() == SEGMENTATION_COMPLETE
    }
}

/// Which end of the link a call is running on.
///
/// Reception may be driven from an interrupt handler; anything running there
/// must never block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Ordinary thread/task context
    Task,
    /// Interrupt service routine
    Interrupt,
}

impl ExecutionContext {
    /// True for interrupt context
    pub const fn is_interrupt(&self) -> bool {
        matches!(self, ExecutionContext::Interrupt)
    }
}
