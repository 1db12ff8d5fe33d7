//! Runtime configuration for the stack and its links

use serde::{Deserialize, Serialize};

/// Sizing of the shared resources of a [`LinkStack`](crate::stack::LinkStack)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Packet buffers in the pool
    pub pool_buffers: usize,
    /// Payload bytes per packet buffer
    pub buffer_size: usize,
    /// Packets the ingress queue holds before dropping
    pub queue_depth: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            pool_buffers: 16,
            buffer_size: 256,
            queue_depth: 16,
        }
    }
}

/// Per-interface settings used when bringing a link up
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Interface name; empty selects the link's default name
    pub name: String,
    /// MTU; zero selects the registry default
    pub mtu: u16,
    /// Largest payload the decoder accepts; zero means the buffer size
    pub max_rx_length: usize,
    /// Node that frames must come from; zero accepts any source
    pub host_node: u8,
    /// This node; zero accepts any destination
    pub node: u8,
    /// Disable route-loop prevention on this interface
    pub split_horizon_off: bool,
}

impl LinkConfig {
    /// Config with the given interface name and everything else defaulted
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn name_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.name.is_empty() {
            default
        } else {
            &self.name
        }
    }
}
