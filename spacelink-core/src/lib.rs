//! # Spacelink Core
//!
//! Serial link layer for a small satellite network stack: turns raw byte
//! streams from a UART or radio into validated packets and frames outgoing
//! packets for the wire.
//!
//! Two framings are supported: MS200 (sync marker, space-packet style header
//! and payload) and EWC (adds a diagnostic trace, a separator, a structured
//! application message and a CRC16 trailer).
//!
//! ## Modules
//!
//! - `constants`: Wire format constants and limits
//! - `types`: Header words (stream id, sequence word) and execution context
//! - `crc`: CRC16 used by EWC frames
//! - `packet`: Packets and the bounded buffer pool
//! - `interface`: Interface descriptor, counters, driver and next-hop traits
//! - `registry`: Interface registry
//! - `queue`: Ingress queue between reception and the router
//! - `decoder` / `encoder`: Receive and transmit plumbing shared by both links
//! - `ms200`, `ewc`: The two link variants
//! - `stack`: Pool, queue and registry bundled per node
//! - `driver`: In-memory driver

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod ewc;
pub mod interface;
pub mod ms200;
pub mod packet;
pub mod queue;
pub mod registry;
pub mod stack;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use config::{LinkConfig, StackConfig};
pub use decoder::{AddressFilter, RxMode};
pub use driver::MemoryDriver;
pub use error::{LinkError, TransmitError};
pub use interface::{Interface, InterfaceStats, LinkDriver, NextHop, Route, StatsSnapshot};
pub use packet::{BufferPool, Packet, PacketMeta};
pub use queue::{Ingress, IngressQueue};
pub use registry::InterfaceRegistry;
pub use stack::LinkStack;
pub use types::{ExecutionContext, PacketType, SequenceWord, StreamId};

/// Result type alias for link operations
pub type Result<T> = core::result::Result<T, LinkError>;
