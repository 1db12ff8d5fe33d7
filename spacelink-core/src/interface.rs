//! Interface descriptors and the contracts between link, driver and router

use crate::constants::IFACE_NAME_MAX;
use crate::error::{LinkError, TransmitError};
use crate::packet::Packet;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::warn;

/// Transmit entry point of an interface, invoked by the router.
///
/// On success the implementation has released the packet. On failure the
/// packet comes back inside the [`TransmitError`].
pub trait NextHop: Send + Sync {
    /// Send `packet` out of `route.iface`
    fn transmit(&self, route: &Route, packet: Packet) -> Result<(), TransmitError>;
}

/// Byte transport underneath a link (UART, radio, ...).
pub trait LinkDriver: Send + Sync {
    /// Write bytes to the transport, returning how many were accepted.
    ///
    /// May accept fewer than offered; the link calls again with the rest.
    /// Must not retain `data` after returning.
    fn write(&self, data: &[u8]) -> Result<usize, LinkError>;

    /// Hook for driver-side error reporting
    fn report_error(&self, error: &LinkError) {
        #[cfg(feature = "logging")]
        warn!("Driver error: {}", error);
        #[cfg(not(feature = "logging"))]
        let _ = error;
    }
}

impl<D: LinkDriver + ?Sized> LinkDriver for Arc<D> {
    fn write(&self, data: &[u8]) -> Result<usize, LinkError> {
        (**self).write(data)
    }

    fn report_error(&self, error: &LinkError) {
        (**self).report_error(error)
    }
}

/// Write all of `data`, calling the driver as many times as it takes
pub(crate) fn write_all<D: LinkDriver + ?Sized>(driver: &D, data: &[u8]) -> Result<(), LinkError> {
    let mut offset = 0;
    while offset < data.len() {
        match driver.write(&data[offset..])? {
            0 => return Err(LinkError::Driver("transport accepted no bytes".into())),
            n => offset += n.min(data.len() - offset),
        }
    }
    Ok(())
}

/// Where a packet is going: the outgoing interface and the next-hop address on it
#[derive(Clone)]
pub struct Route {
    /// Outgoing interface
    pub iface: Arc<Interface>,
    /// Link-level address of the next hop
    pub via: u8,
}

impl Route {
    /// Route straight to the destination on `iface`
    pub fn direct(iface: Arc<Interface>) -> Self {
        Self { iface, via: 0 }
    }

    /// Hand `packet` to the interface's next-hop function
    pub fn transmit(&self, packet: Packet) -> Result<(), TransmitError> {
        self.iface.nexthop.transmit(self, packet)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("iface", &self.iface.name())
            .field("via", &self.via)
            .finish()
    }
}

/// Per-interface traffic and error counters.
///
/// Each event increments exactly one counter once; counters only grow
/// (wrapping at `u32::MAX`).
#[derive(Debug, Default)]
pub struct InterfaceStats {
    tx: AtomicU32,
    rx: AtomicU32,
    tx_error: AtomicU32,
    rx_error: AtomicU32,
    drop: AtomicU32,
    autherr: AtomicU32,
    frame: AtomicU32,
    txbytes: AtomicU32,
    rxbytes: AtomicU32,
    irq: AtomicU32,
}

/// Plain copy of [`InterfaceStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Successfully transmitted packets
    pub tx: u32,
    /// Successfully received packets
    pub rx: u32,
    /// Transmit errors
    pub tx_error: u32,
    /// Receive errors, e.g. unsupported or malformed content
    pub rx_error: u32,
    /// Dropped packets
    pub drop: u32,
    /// Authentication errors
    pub autherr: u32,
    /// Frame format errors
    pub frame: u32,
    /// Transmitted bytes
    pub txbytes: u32,
    /// Received bytes
    pub rxbytes: u32,
    /// Receive calls made from interrupt context
    pub irq: u32,
}

fn bump(counter: &AtomicU32, by: u32) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl InterfaceStats {
    /// A packet went out, `bytes` long on the wire
    pub fn record_tx(&self, bytes: usize) {
        bump(&self.tx, 1);
        bump(&self.txbytes, bytes as u32);
    }

    /// A packet was delivered to the ingress queue
    pub fn record_rx(&self, bytes: usize) {
        bump(&self.rx, 1);
        bump(&self.rxbytes, bytes as u32);
    }

    /// A transmit failed
    pub fn record_tx_error(&self) {
        bump(&self.tx_error, 1);
    }

    /// A received frame carried unusable content
    pub fn record_rx_error(&self) {
        bump(&self.rx_error, 1);
    }

    /// A packet was discarded (misaddressed, no buffer, queue full)
    pub fn record_drop(&self) {
        bump(&self.drop, 1);
    }

    /// Authentication failed in an upper layer
    pub fn record_autherr(&self) {
        bump(&self.autherr, 1);
    }

    /// A frame was malformed
    pub fn record_frame_error(&self) {
        bump(&self.frame, 1);
    }

    /// Reception ran in interrupt context
    pub fn record_irq(&self) {
        bump(&self.irq, 1);
    }

    /// Copy out all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU32| c.load(Ordering::Relaxed);
        StatsSnapshot {
            tx: load(&self.tx),
            rx: load(&self.rx),
            tx_error: load(&self.tx_error),
            rx_error: load(&self.rx_error),
            drop: load(&self.drop),
            autherr: load(&self.autherr),
            frame: load(&self.frame),
            txbytes: load(&self.txbytes),
            rxbytes: load(&self.rxbytes),
            irq: load(&self.irq),
        }
    }
}

/// A network interface as seen by the router
pub struct Interface {
    name: String,
    nexthop: Arc<dyn NextHop>,
    mtu: u16,
    split_horizon_off: bool,
    stats: InterfaceStats,
}

impl Interface {
    /// Start describing an interface
    pub fn builder(name: impl Into<String>, nexthop: Arc<dyn NextHop>) -> InterfaceBuilder {
        InterfaceBuilder {
            name: name.into(),
            nexthop,
            mtu: 0,
            split_horizon_off: false,
        }
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum transmission unit
    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    /// True when route-loop prevention is disabled for this interface.
    /// Only stored here; the router enforces it.
    pub fn split_horizon_off(&self) -> bool {
        self.split_horizon_off
    }

    /// Traffic and error counters
    pub fn stats(&self) -> &InterfaceStats {
        &self.stats
    }

    /// Whether `name` refers to this interface, comparing at most
    /// [`IFACE_NAME_MAX`] bytes
    pub fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("mtu", &self.mtu)
            .field("split_horizon_off", &self.split_horizon_off)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// Bounded, case-sensitive name compare
pub(crate) fn names_equal(a: &str, b: &str) -> bool {
    let a = &a.as_bytes()[..a.len().min(IFACE_NAME_MAX)];
    let b = &b.as_bytes()[..b.len().min(IFACE_NAME_MAX)];
    a == b
}

/// Builder for [`Interface`]
pub struct InterfaceBuilder {
    name: String,
    nexthop: Arc<dyn NextHop>,
    mtu: u16,
    split_horizon_off: bool,
}

impl InterfaceBuilder {
    /// Set the MTU. Zero lets the registry pick a default.
    pub fn mtu(mut self, mtu: u16) -> Self {
        self.mtu = mtu;
        self
    }

    /// Disable route-loop prevention
    pub fn split_horizon_off(mut self, off: bool) -> Self {
        self.split_horizon_off = off;
        self
    }

    /// Finish the descriptor; registration happens separately
    pub fn build(self) -> Interface {
        Interface {
            name: self.name,
            nexthop: self.nexthop,
            mtu: self.mtu,
            split_horizon_off: self.split_horizon_off,
            stats: InterfaceStats::default(),
        }
    }

    pub(crate) fn mtu_or(mut self, default: u16) -> Self {
        if self.mtu == 0 {
            self.mtu = default;
        }
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}
