//! Packets and the bounded buffer pool they come from
//!
//! The pool is a fixed number of fixed-size buffers. Acquisition is
//! lock-free so the receive path may run in interrupt context. A packet
//! returns its slot to the pool when dropped, which is the only way a packet
//! is released: it can neither leak nor be released twice.

use crate::types::PacketType;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Addressing and identification carried alongside a packet's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketMeta {
    /// Source node
    pub src: u8,
    /// Destination node
    pub dst: u8,
    /// Sub-port/channel used by upper layers to pick a handler
    pub sport: u8,
    /// Application id (11 bits)
    pub apid: u16,
    /// Telemetry or command
    pub packet_type: PacketType,
    /// Sequence count of the frame the packet arrived in (14 bits)
    pub sequence: u16,
}

#[derive(Debug)]
struct PoolShared {
    buffers: usize,
    data_size: usize,
    in_use: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
}

/// Acquisition/release accounting for a [`BufferPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    /// Buffers in the pool
    pub buffers: usize,
    /// Buffers currently handed out
    pub in_use: usize,
    /// Total successful acquisitions
    pub acquired: u64,
    /// Total releases
    pub released: u64,
}

/// Bounded pool of packet buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    /// Create a pool of `buffers` packets, each holding up to `data_size` payload bytes
    pub fn new(buffers: usize, data_size: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                buffers,
                data_size,
                in_use: AtomicUsize::new(0),
                acquired: AtomicU64::new(0),
                released: AtomicU64::new(0),
            }),
        }
    }

    /// Payload capacity of every buffer
    pub fn data_size(&self) -> usize {
        self.shared.data_size
    }

    /// Take a buffer without blocking. `None` when the pool is exhausted.
    pub fn get(&self) -> Option<Packet> {
        let shared = &self.shared;
        shared
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < shared.buffers).then_some(n + 1)
            })
            .ok()?;
        shared.acquired.fetch_add(1, Ordering::Relaxed);

        Some(Packet {
            data: BytesMut::with_capacity(shared.data_size),
            meta: PacketMeta::default(),
            pool: Arc::clone(shared),
        })
    }

    /// Take a buffer and fill it with `payload`.
    ///
    /// Returns `None` when the pool is exhausted or the payload does not fit.
    pub fn packet_from(&self, meta: PacketMeta, payload: &[u8]) -> Option<Packet> {
        if payload.len() > self.data_size() {
            return None;
        }
        let mut packet = self.get()?;
        packet.meta = meta;
        packet.data.put_slice(payload);
        Some(packet)
    }

    /// Snapshot of the pool accounting
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            buffers: self.shared.buffers,
            in_use: self.shared.in_use.load(Ordering::Acquire),
            acquired: self.shared.acquired.load(Ordering::Relaxed),
            released: self.shared.released.load(Ordering::Relaxed),
        }
    }
}

/// A network packet owned by the link layer or its caller
#[derive(Debug)]
pub struct Packet {
    data: BytesMut,
    /// Addressing and identification
    pub meta: PacketMeta,
    pool: Arc<PoolShared>,
}

impl Packet {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload capacity of the underlying buffer
    pub fn capacity(&self) -> usize {
        self.pool.data_size
    }

    /// Room left in the buffer
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Append to the payload. Returns false, leaving the payload untouched,
    /// when the bytes do not fit.
    pub fn extend(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.data.put_slice(bytes);
        true
    }

    /// Drop the payload, keeping the buffer
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Copy of the payload that outlives the packet
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }
}

impl Drop for Packet {
    fn drop(&mut self) {
        self.pool.in_use.fetch_sub(1, Ordering::AcqRel);
        self.pool.released.fetch_add(1, Ordering::Relaxed);
    }
}
