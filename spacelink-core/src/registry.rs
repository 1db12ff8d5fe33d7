//! Collection of the interfaces known to the stack
//!
//! Interfaces are added at bring-up and live as long as the registry; there
//! is no removal.

use crate::constants::PACKET_CRC32_SIZE;
use crate::error::LinkError;
use crate::interface::{Interface, InterfaceBuilder};
use parking_lot::RwLock;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// The interfaces of one stack instance
#[derive(Debug)]
pub struct InterfaceRegistry {
    default_mtu: u16,
    ifaces: RwLock<Vec<Arc<Interface>>>,
}

impl InterfaceRegistry {
    /// Create an empty registry for a stack whose packet buffers hold
    /// `buffer_data_size` bytes. Interfaces registered without an MTU get
    /// that size minus room for a packet-level CRC32.
    pub fn new(buffer_data_size: usize) -> Self {
        let default_mtu = buffer_data_size
            .saturating_sub(PACKET_CRC32_SIZE)
            .min(u16::MAX as usize) as u16;
        Self {
            default_mtu,
            ifaces: RwLock::new(Vec::new()),
        }
    }

    /// MTU given to interfaces registered without one
    pub fn default_mtu(&self) -> u16 {
        self.default_mtu
    }

    /// Add an interface.
    ///
    /// Fails with [`LinkError::InUse`] if an interface with the same name
    /// (compared on the first [`IFACE_NAME_MAX`](crate::constants::IFACE_NAME_MAX)
    /// bytes) exists, and with [`LinkError::InvalidArgument`] for an empty name.
    pub fn register(&self, builder: InterfaceBuilder) -> Result<Arc<Interface>, LinkError> {
        if builder.name().is_empty() {
            return Err(LinkError::InvalidArgument("interface name is empty".into()));
        }

        let mut ifaces = self.ifaces.write();
        if ifaces.iter().any(|i| i.name_matches(builder.name())) {
            return Err(LinkError::InUse(builder.name().to_string()));
        }

        let iface = Arc::new(builder.mtu_or(self.default_mtu).build());

        #[cfg(feature = "logging")]
        debug!("Registered interface {} (mtu {})", iface.name(), iface.mtu());

        ifaces.push(Arc::clone(&iface));
        Ok(iface)
    }

    /// Find an interface by name
    pub fn lookup(&self, name: &str) -> Option<Arc<Interface>> {
        self.ifaces
            .read()
            .iter()
            .find(|i| i.name_matches(name))
            .cloned()
    }

    /// All interfaces, in registration order
    pub fn interfaces(&self) -> Vec<Arc<Interface>> {
        self.ifaces.read().clone()
    }

    /// Number of registered interfaces
    pub fn len(&self) -> usize {
        self.ifaces.read().len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
