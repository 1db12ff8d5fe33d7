//! Error types for link operations

use crate::packet::Packet;

/// Errors surfaced by transmit, registration and configuration.
///
/// Reception never returns these to its caller; receive-side failures are
/// only visible through the interface counters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Not enough memory
    #[error("Not enough memory")]
    NoMemory,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation timed out
    #[error("Operation timed out")]
    TimedOut,

    /// Resource already in use, e.g. a duplicate interface name
    #[error("Resource already in use: {0}")]
    InUse(String),

    /// Device or resource busy
    #[error("Device or resource busy")]
    Busy,

    /// Transmission failed
    #[error("Transmission failed")]
    Transmit,

    /// Error in driver layer
    #[error("Driver error: {0}")]
    Driver(String),

    /// No more buffer space available
    #[error("No more buffer space available")]
    NoBuffers,

    /// Frame checksum mismatch
    #[error("CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    Crc {
        /// The checksum carried by the frame.
        expected: u16,
        /// The checksum calculated over the received bytes.
        actual: u16,
    },
}

impl LinkError {
    /// Numeric code of the error as used on the wire and in C callers.
    pub const fn code(&self) -> i32 {
        match self {
            LinkError::NoMemory => -1,
            LinkError::InvalidArgument(_) => -2,
            LinkError::TimedOut => -3,
            LinkError::InUse(_) => -4,
            LinkError::Busy => -6,
            LinkError::NoBuffers => -9,
            LinkError::Transmit => -10,
            LinkError::Driver(_) => -11,
            LinkError::Crc { .. } => -102,
        }
    }
}

/// A failed transmit.
///
/// The packet travels back to the caller, who decides whether to retry or
/// release it (dropping the error releases it).
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct TransmitError {
    /// Why the transmit failed
    pub error: LinkError,
    /// The packet that was not sent
    pub packet: Packet,
}

impl TransmitError {
    /// Pair an error with the packet that could not be sent
    pub fn new(error: LinkError, packet: Packet) -> Self {
        Self { error, packet }
    }

    /// Take the packet back, e.g. for a retry
    pub fn into_packet(self) -> Packet {
        self.packet
    }
}
