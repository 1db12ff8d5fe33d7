//! Fuzzing entry points for the spacelink-core decoders
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_ms200_feed
//!
//! The first input byte picks the chunk size the rest is fed in, so the
//! fuzzer also explores how frames are split across `feed` calls.

use spacelink_core::{
    ewc::{EwcDecoder, EwcMessage},
    ms200::Ms200Decoder,
    BufferPool, ExecutionContext, IngressQueue, Interface, NextHop, Packet, Route, TransmitError,
};
use std::sync::Arc;

struct Discard;

impl NextHop for Discard {
    fn transmit(&self, _route: &Route, _packet: Packet) -> Result<(), TransmitError> {
        Ok(())
    }
}

fn setup() -> (Arc<Interface>, BufferPool, IngressQueue) {
    let iface = Arc::new(Interface::builder("FUZZ", Arc::new(Discard)).build());
    (iface, BufferPool::new(8, 256), IngressQueue::new(4))
}

fn split(data: &[u8]) -> (usize, &[u8]) {
    match data.split_first() {
        Some((first, rest)) => (*first as usize + 1, rest),
        None => (1, data),
    }
}

/// Feed arbitrary bytes to an MS200 decoder; must never panic or leak
pub fn fuzz_ms200_feed(data: &[u8]) {
    let (chunk, stream) = split(data);
    let (iface, pool, queue) = setup();
    let mut decoder = Ms200Decoder::new(iface, pool.clone(), queue.clone(), 0);

    for piece in stream.chunks(chunk) {
        decoder.feed(piece, ExecutionContext::Interrupt);
    }
    decoder.reset();
    assert_eq!(pool.stats().in_use, queue.len());
}

/// Feed arbitrary bytes to an EWC decoder; must never panic or leak
pub fn fuzz_ewc_feed(data: &[u8]) {
    let (chunk, stream) = split(data);
    let (iface, pool, queue) = setup();
    let mut decoder = EwcDecoder::new(iface, pool.clone(), queue.clone(), 0);

    for piece in stream.chunks(chunk) {
        decoder.feed(piece, ExecutionContext::Task);
    }
    decoder.reset();
    assert_eq!(pool.stats().in_use, queue.len());
}

/// Parse arbitrary bytes as an EWC message; whatever parses must re-encode
/// to the same bytes
pub fn fuzz_ewc_message(data: &[u8]) {
    if let Ok(message) = EwcMessage::parse(data) {
        assert_eq!(&message.to_bytes()[..], data);
    }
}
