//! Transmit path shared by the MS200 and EWC links
//!
//! A frame goes to the driver in several writes (header, payload, trailer),
//! so the link holds an exclusive lock for the whole frame. Frames sent on one
//! link therefore never interleave and leave in the order the lock was taken.

use crate::constants::TX_LOCK_TIMEOUT_MS;
use crate::error::{LinkError, TransmitError};
use crate::interface::{write_all, LinkDriver, Route};
use crate::packet::Packet;
use crate::types::SequenceWord;
use bytes::Bytes;
use parking_lot::Mutex;
use std::time::Duration;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Bytes written around a packet's payload
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameParts {
    /// Sync marker and header
    pub(crate) head: Bytes,
    /// Trailer (checksum), possibly empty
    pub(crate) tail: Bytes,
}

#[derive(Debug, Default)]
struct TxState {
    sequence: u16,
}

impl TxState {
    fn next_sequence(&mut self) -> SequenceWord {
        let word = SequenceWord::complete(self.sequence);
        self.sequence = SequenceWord::complete(self.sequence.wrapping_add(1)).count();
        word
    }
}

/// A driver plus the lock that serialises frames onto it
#[derive(Debug)]
pub(crate) struct TxChannel<D> {
    driver: D,
    state: Mutex<TxState>,
    lock_timeout: Duration,
}

impl<D: LinkDriver> TxChannel<D> {
    pub(crate) fn new(driver: D) -> Self {
        Self {
            driver,
            state: Mutex::new(TxState::default()),
            lock_timeout: Duration::from_millis(TX_LOCK_TIMEOUT_MS),
        }
    }

    pub(crate) fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }

    /// Frame `packet` with `frame` and push it through the driver.
    ///
    /// Counts `tx`/`txbytes` on success and `tx_error` on any failure.
    pub(crate) fn transmit<F>(
        &self,
        route: &Route,
        packet: Packet,
        frame: F,
    ) -> Result<(), TransmitError>
    where
        F: FnOnce(&Packet, SequenceWord) -> Result<FrameParts, LinkError>,
    {
        let stats = route.iface.stats();

        if packet.len() > route.iface.mtu() as usize {
            stats.record_tx_error();
            let error = LinkError::InvalidArgument(format!(
                "payload of {} bytes exceeds MTU {}",
                packet.len(),
                route.iface.mtu()
            ));
            return Err(TransmitError::new(error, packet));
        }

        let Some(mut state) = self.state.try_lock_for(self.lock_timeout) else {
            #[cfg(feature = "logging")]
            warn!("{}: transmit lock busy", route.iface.name());
            stats.record_tx_error();
            return Err(TransmitError::new(LinkError::Busy, packet));
        };

        let sequence = state.next_sequence();
        let parts = match frame(&packet, sequence) {
            Ok(parts) => parts,
            Err(error) => {
                stats.record_tx_error();
                return Err(TransmitError::new(error, packet));
            }
        };

        let written = write_all(&self.driver, &parts.head)
            .and_then(|_| write_all(&self.driver, packet.payload()))
            .and_then(|_| write_all(&self.driver, &parts.tail));
        drop(state);

        if let Err(error) = written {
            self.driver.report_error(&error);
            stats.record_tx_error();
            return Err(TransmitError::new(LinkError::Transmit, packet));
        }

        let total = parts.head.len() + packet.len() + parts.tail.len();
        stats.record_tx(total);

        #[cfg(feature = "logging")]
        debug!(
            "{}: sent {} byte frame (seq {})",
            route.iface.name(),
            total,
            sequence.count()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_wraps_at_14_bits() {
        let mut state = TxState {
            sequence: 0x3FFE,
        };
        assert_eq!(state.next_sequence().count(), 0x3FFE);
        assert_eq!(state.next_sequence().count(), 0x3FFF);
        assert_eq!(state.next_sequence().count(), 0);
        assert!(state.next_sequence().is_complete());
    }
}
